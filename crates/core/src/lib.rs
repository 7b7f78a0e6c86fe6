pub mod config;
pub mod dates;
pub mod domain;
pub mod money;
pub mod naming;
pub mod parser;

pub use domain::quote::{AmountBasis, LineItem, Quote, QuoteHeader};
pub use domain::record::QuoteLogRecord;
pub use domain::session::{CartEntry, QuoteId, QuoteNote, QuoteSession};
pub use parser::{parse_item_line, parse_quote_text, LineGrammar, QuoteParser};
