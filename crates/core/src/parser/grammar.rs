//! Item-line grammars, tried in a fixed order. The first grammar that matches
//! a line decides how it is split; the order is part of the contract.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::quote::LineItem;
use crate::money::parse_decimal;

static RE_SEMICOLON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([0-9]+(?:[.,][0-9]+)?)\s*;\s*(.+?)\s*;\s*([0-9]+(?:[.,][0-9]{1,2})?)\s*$")
        .expect("valid semicolon grammar")
});

static RE_AT_SIGN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*([0-9]+(?:[.,][0-9]+)?)\s*(?:(?:x|por)\s+)?(.+?)\s*@\s*([0-9]+(?:[.,][0-9]{1,2})?)\s*$",
    )
    .expect("valid at-sign grammar")
});

static RE_CURRENCY_DASH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*([0-9]+(?:[.,][0-9]+)?)\s+(.+?)\s*[-–]\s*bs?\.?\s*([0-9]+(?:[.,][0-9]{1,2})?)\s*$",
    )
    .expect("valid currency-dash grammar")
});

static RE_TRAILING_AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([0-9]+(?:[.,][0-9]+)?)\s+(.+?)\s+([0-9]+(?:[.,][0-9]{1,2})?)\s*$")
        .expect("valid trailing-amount grammar")
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineGrammar {
    /// `3; Bidón 20L; 150`
    Semicolon,
    /// `3 x Bidón 20L @ 150`
    AtSign,
    /// `3 Bidón 20L - Bs 150`
    CurrencyDash,
    /// `3 Bidón 20L 150`; the last bare number is the amount.
    TrailingAmount,
}

impl LineGrammar {
    pub const PRIORITY: [LineGrammar; 4] =
        [Self::Semicolon, Self::AtSign, Self::CurrencyDash, Self::TrailingAmount];

    fn pattern(self) -> &'static Regex {
        match self {
            Self::Semicolon => &RE_SEMICOLON,
            Self::AtSign => &RE_AT_SIGN,
            Self::CurrencyDash => &RE_CURRENCY_DASH,
            Self::TrailingAmount => &RE_TRAILING_AMOUNT,
        }
    }

    /// Applies this grammar alone to `line`.
    pub fn parse(self, line: &str) -> Option<LineItem> {
        let captures = self.pattern().captures(line)?;
        let quantity = parse_decimal(&captures[1]).unwrap_or(Decimal::ZERO);
        let amount = parse_decimal(&captures[3])?;

        let description = match captures[2].trim() {
            "" => line.trim(),
            trimmed => trimmed,
        };

        Some(LineItem::new(quantity, description, amount))
    }
}

/// Runs the grammars in priority order and reports which one matched.
pub fn parse_item_line(line: &str) -> Option<(LineGrammar, LineItem)> {
    LineGrammar::PRIORITY
        .iter()
        .find_map(|grammar| grammar.parse(line).map(|item| (*grammar, item)))
}
