use std::path::PathBuf;

use cotiza_core::config::ConfigOverrides;
use cotiza_core::{AmountBasis, QuoteParser};

use crate::commands::{load_config, read_input, CommandResult};

const COMMAND: &str = "parse";

#[derive(Debug, Clone)]
pub struct ParseArgs {
    pub config_path: Option<PathBuf>,
    pub basis: AmountBasis,
    pub input: Option<PathBuf>,
}

pub fn run(args: ParseArgs) -> CommandResult {
    let config = match load_config(COMMAND, args.config_path, ConfigOverrides::default()) {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let raw = match read_input(args.input.as_deref()) {
        Ok(raw) => raw,
        Err(error) => return CommandResult::failure(COMMAND, "input", format!("{error:#}"), 3),
    };

    let quote = QuoteParser::new(args.basis).with_offset(config.utc_offset()).parse(&raw);
    match serde_json::to_value(&quote) {
        Ok(data) => CommandResult::success_with(COMMAND, quote.summary(), Some(data)),
        Err(error) => CommandResult::failure(COMMAND, "serialization", error.to_string(), 4),
    }
}
