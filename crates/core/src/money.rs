//! Monetary helpers shared by the parser and the renderer.
//!
//! Amounts are kept as [`Decimal`] end to end. Rounding to cents happens once,
//! on sums, with half-away-from-zero semantics.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

pub const CURRENCY: &str = "BOB";

/// Rounds a value to two decimal places, half away from zero.
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Formats `value` as `1,234.56`: two decimals, comma-grouped thousands and no
/// currency symbol.
pub fn format_money(value: Decimal) -> String {
    let rounded = round_cents(value);
    let fixed = format!("{:.2}", rounded.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{sign}{grouped}.{cents}")
}

/// Parses a human-typed number where either `.` or `,` is the decimal
/// separator (`"12,5"`, `"12.50"`). Returns `None` for anything else.
pub fn parse_decimal(token: &str) -> Option<Decimal> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    let mut separators = 0;
    for ch in token.chars() {
        match ch {
            '0'..='9' => {}
            '.' | ',' => separators += 1,
            _ => return None,
        }
    }
    if separators > 1 || token.starts_with(['.', ',']) || token.ends_with(['.', ',']) {
        return None;
    }

    Decimal::from_str(&token.replace(',', ".")).ok()
}

/// Renders a quantity the way a person would write it: `2`, `1.5`, `0.25`.
pub fn format_quantity(value: Decimal) -> String {
    value.normalize().to_string()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{format_money, format_quantity, parse_decimal, round_cents};

    #[test]
    fn rounds_midpoint_away_from_zero() {
        assert_eq!(round_cents(Decimal::new(15005, 3)), Decimal::new(1501, 2));
        assert_eq!(round_cents(Decimal::new(-15005, 3)), Decimal::new(-1501, 2));
        assert_eq!(round_cents(Decimal::new(15004, 3)), Decimal::new(1500, 2));
    }

    #[test]
    fn formats_money_with_grouping() {
        assert_eq!(format_money(Decimal::ZERO), "0.00");
        assert_eq!(format_money(Decimal::new(5, 0)), "5.00");
        assert_eq!(format_money(Decimal::new(123456, 2)), "1,234.56");
        assert_eq!(format_money(Decimal::new(100000000, 2)), "1,000,000.00");
        assert_eq!(format_money(Decimal::new(-98765432, 2)), "-987,654.32");
        assert_eq!(format_money(Decimal::new(999, 0)), "999.00");
    }

    #[test]
    fn parses_either_decimal_separator() {
        assert_eq!(parse_decimal("12,5"), Some(Decimal::new(125, 1)));
        assert_eq!(parse_decimal("12.50"), Some(Decimal::new(1250, 2)));
        assert_eq!(parse_decimal("300"), Some(Decimal::new(300, 0)));
        assert_eq!(parse_decimal("1.234,5"), None);
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("5."), None);
    }

    #[test]
    fn quantities_drop_trailing_zeros() {
        assert_eq!(format_quantity(Decimal::new(200, 2)), "2");
        assert_eq!(format_quantity(Decimal::new(15, 1)), "1.5");
    }
}
