pub mod quote;
pub mod record;
pub mod session;
