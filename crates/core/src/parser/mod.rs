//! Free-text quote parser.
//!
//! Turns a human-typed message into a [`Quote`]. Parsing never fails: missing
//! fields fall back to defaults and item lines that match no grammar are
//! dropped, so the item list is the record of what could be recovered.
//!
//! ```text
//! Empresa: ACME
//! Fecha: 15/01/2024
//! Descripción: Branding
//! Items:
//! 2; Diseño de logo; 350
//! 1 Mantenimiento mensual - Bs 300
//! Total: Bs 600
//! ```

pub mod grammar;

use chrono::{FixedOffset, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use tracing::debug;

use crate::dates::{default_offset, parse_flexible_date, today_in};
use crate::domain::quote::{AmountBasis, Quote, QuoteHeader};
use crate::money::parse_decimal;

pub use grammar::{parse_item_line, LineGrammar};

static RE_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(empresa|cliente|fecha|descripci[oó]n|desc|concepto|mensaje|total|[ií]tems?)\s*:\s*(.*)$",
    )
    .expect("valid label regex")
});

static RE_TOTAL_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:bs?\.?\s*)?([0-9]+(?:[.,][0-9]{1,2})?)").expect("valid total regex")
});

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Label {
    Client,
    Date,
    Description,
    Message,
    Total,
    Items,
}

impl Label {
    fn classify(raw: &str) -> Self {
        let lowered = raw.to_lowercase();
        match lowered.as_str() {
            "empresa" | "cliente" => Self::Client,
            "fecha" => Self::Date,
            "mensaje" => Self::Message,
            "total" => Self::Total,
            "desc" | "descripcion" | "descripción" | "concepto" => Self::Description,
            _ => Self::Items,
        }
    }

    fn is_multiline(self) -> bool {
        matches!(self, Self::Description | Self::Message | Self::Items)
    }
}

/// Labelled values and item lines found in one message.
#[derive(Debug, Default)]
struct Sections<'a> {
    client: Option<&'a str>,
    date: Option<&'a str>,
    total: Option<&'a str>,
    description: Vec<&'a str>,
    message: Vec<&'a str>,
    items: Vec<&'a str>,
    unlabelled: Vec<&'a str>,
    saw_items_label: bool,
}

impl<'a> Sections<'a> {
    fn split(raw: &'a str) -> Self {
        let mut sections = Self::default();
        let mut open: Option<Label> = None;

        for line in raw.lines() {
            if let Some(captures) = RE_LABEL.captures(line) {
                let label = Label::classify(&captures[1]);
                let value = captures.get(2).map_or("", |value| value.as_str().trim());

                match label {
                    Label::Client => {
                        sections.client.get_or_insert(value);
                    }
                    Label::Date => {
                        sections.date.get_or_insert(value);
                    }
                    Label::Total => {
                        sections.total.get_or_insert(value);
                    }
                    Label::Items => sections.saw_items_label = true,
                    Label::Description | Label::Message => {}
                }

                open = label.is_multiline().then_some(label);
                if label.is_multiline() && !value.is_empty() {
                    sections.bucket(label).push(value);
                }
                continue;
            }

            match open {
                Some(label) => sections.bucket(label).push(line),
                None => sections.unlabelled.push(line),
            }
        }

        sections
    }

    fn bucket(&mut self, label: Label) -> &mut Vec<&'a str> {
        match label {
            Label::Description => &mut self.description,
            Label::Message => &mut self.message,
            _ => &mut self.items,
        }
    }

    /// The labelled `Items:` block, or every unlabelled line when there is none.
    fn item_lines(&self) -> impl Iterator<Item = &'a str> + '_ {
        let block = if self.saw_items_label { &self.items } else { &self.unlabelled };
        block.iter().copied().map(str::trim).filter(|line| !line.is_empty())
    }
}

/// Parses quote text under one explicit [`AmountBasis`].
#[derive(Clone, Debug)]
pub struct QuoteParser {
    basis: AmountBasis,
    offset: FixedOffset,
    today: Option<NaiveDate>,
}

impl Default for QuoteParser {
    fn default() -> Self {
        Self::new(AmountBasis::LineSubtotal)
    }
}

impl QuoteParser {
    pub fn new(basis: AmountBasis) -> Self {
        Self { basis, offset: default_offset(), today: None }
    }

    /// Offset used to decide what "today" is when no date is given.
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    /// Pins the fallback date instead of reading the clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn basis(&self) -> AmountBasis {
        self.basis
    }

    pub fn parse(&self, raw: &str) -> Quote {
        let sections = Sections::split(raw);

        let date = sections
            .date
            .and_then(parse_flexible_date)
            .unwrap_or_else(|| self.today.unwrap_or_else(|| today_in(self.offset)));

        let explicit_total = sections.total.and_then(parse_total);

        let mut items = Vec::new();
        let mut dropped = 0usize;
        let mut running = Decimal::ZERO;
        for line in sections.item_lines() {
            let Some((grammar, item)) = parse_item_line(line) else {
                dropped += 1;
                debug!(event_name = "quote.parser.line_dropped", line, "item line dropped");
                continue;
            };

            // Lines whose amount cannot be represented are dropped, not clamped.
            let Some(next) = item
                .checked_line_total(self.basis)
                .and_then(|line_total| running.checked_add(line_total))
            else {
                dropped += 1;
                debug!(
                    event_name = "quote.parser.line_dropped",
                    line,
                    reason = "amount_overflow",
                    "item line dropped"
                );
                continue;
            };

            running = next;
            debug!(
                event_name = "quote.parser.line_matched",
                grammar = ?grammar,
                "item line matched"
            );
            items.push(item);
        }

        let header = QuoteHeader {
            client_name: sections.client.unwrap_or_default().to_string(),
            date,
            description: join_block(&sections.description),
            message: join_block(&sections.message),
        };

        debug!(
            event_name = "quote.parser.parsed",
            items = items.len(),
            dropped,
            basis = ?self.basis,
            explicit_total = explicit_total.is_some(),
            "quote text parsed"
        );

        Quote::new(header, self.basis, items, explicit_total)
    }
}

/// Parses with the line-subtotal basis and the default offset.
pub fn parse_quote_text(raw: &str) -> Quote {
    QuoteParser::default().parse(raw)
}

fn parse_total(value: &str) -> Option<Decimal> {
    let captures = RE_TOTAL_VALUE.captures(value.trim())?;
    parse_decimal(&captures[1])
}

fn join_block(lines: &[&str]) -> String {
    lines.iter().map(|line| line.trim_end()).collect::<Vec<_>>().join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{parse_quote_text, QuoteParser};
    use crate::domain::quote::{AmountBasis, LineItem};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date")
    }

    fn parser() -> QuoteParser {
        QuoteParser::new(AmountBasis::LineSubtotal).with_today(today())
    }

    const TEMPLATE: &str = "Empresa: ACME SRL\nFecha: 15/01/2024\n\nDescripción: Campaña\nde verano\n\nItems:\n2; Diseño de logo; 350\n1 Mantenimiento mensual - Bs 300\n5 Horas de soporte 100\n";

    #[test]
    fn parses_labelled_template() {
        let quote = parser().parse(TEMPLATE);

        assert_eq!(quote.client_name(), "ACME SRL");
        assert_eq!(quote.date(), NaiveDate::from_ymd_opt(2024, 1, 15).expect("valid date"));
        assert_eq!(quote.description(), "Campaña\nde verano");
        assert_eq!(
            quote.items(),
            &[
                LineItem::new(Decimal::from(2), "Diseño de logo", Decimal::from(350)),
                LineItem::new(Decimal::from(1), "Mantenimiento mensual", Decimal::from(300)),
                LineItem::new(Decimal::from(5), "Horas de soporte", Decimal::from(100)),
            ]
        );
        assert_eq!(quote.subtotal(), Decimal::from(750));
        assert_eq!(quote.total(), Decimal::from(750));
    }

    #[test]
    fn explicit_total_is_authoritative() {
        let quote = parser().parse("Cliente: X\nItems:\n1; A; 100\n2; B; 200\nTotal: Bs 500");

        assert_eq!(quote.subtotal(), Decimal::from(300));
        assert_eq!(quote.total(), Decimal::from(500));
        assert_eq!(quote.explicit_total(), Some(Decimal::from(500)));
    }

    #[test]
    fn total_accepts_comma_decimals_and_ignores_garbage() {
        let quote = parser().parse("Items:\n1; A; 100\nTOTAL: bs. 99,90");
        assert_eq!(quote.total(), Decimal::new(9990, 2));

        let quote = parser().parse("Items:\n1; A; 100\nTotal: a convenir");
        assert_eq!(quote.explicit_total(), None);
        assert_eq!(quote.total(), Decimal::from(100));
    }

    #[test]
    fn labels_are_order_insensitive_and_case_insensitive() {
        let quote = parser().parse("ITEMS:\n1; A; 10\nFECHA: 2024-02-03\ncliente: Beta");

        assert_eq!(quote.client_name(), "Beta");
        assert_eq!(quote.date(), NaiveDate::from_ymd_opt(2024, 2, 3).expect("valid date"));
        assert_eq!(quote.items().len(), 1);
    }

    #[test]
    fn without_items_label_unlabelled_lines_are_items() {
        let quote = parser().parse("Empresa: Gamma\n3 x Banner @ 50\nhola\n2 Stickers 20\nTotal: 80");

        assert_eq!(quote.client_name(), "Gamma");
        assert_eq!(quote.items().len(), 2);
        assert_eq!(quote.items()[0].description, "Banner");
        assert_eq!(quote.items()[1].amount, Decimal::from(20));
        assert_eq!(quote.total(), Decimal::from(80));
    }

    #[test]
    fn item_text_on_label_line_is_kept() {
        let quote = parser().parse("Ítems: 2; Logo; 350\n1; Web; 900");
        assert_eq!(quote.items().len(), 2);
        assert_eq!(quote.items()[0].description, "Logo");
    }

    #[test]
    fn malformed_lines_are_dropped_without_failing() {
        let quote = parser().parse("Items:\n2; Logo; 350\nsin formato\n;;;\nx 3 y\n1 Web 900");
        assert_eq!(quote.items().len(), 2);
        assert_eq!(quote.subtotal(), Decimal::from(1250));
    }

    #[test]
    fn missing_or_bad_date_defaults_to_today() {
        assert_eq!(parser().parse("Items:\n1; A; 1").date(), today());
        assert_eq!(parser().parse("Fecha: ayer\nItems:\n1; A; 1").date(), today());
    }

    #[test]
    fn message_label_is_captured_separately() {
        let quote = parser().parse("Mensaje: Entregar el lunes\nItems:\n1; A; 1");
        assert_eq!(quote.message(), "Entregar el lunes");
        assert_eq!(quote.items().len(), 1);
    }

    #[test]
    fn empty_text_yields_empty_quote() {
        let quote = parser().parse("");
        assert!(quote.items().is_empty());
        assert_eq!(quote.client_name(), "");
        assert_eq!(quote.total(), Decimal::ZERO);
    }

    #[test]
    fn unit_price_basis_multiplies_lines() {
        let quote = QuoteParser::new(AmountBasis::UnitPrice)
            .with_today(today())
            .parse("Items:\n3 x Bidón 20L @ 150\n2; Tapa; 10,5");

        assert_eq!(quote.basis(), AmountBasis::UnitPrice);
        assert_eq!(quote.subtotal(), Decimal::from(471));
    }

    #[test]
    fn oversized_unit_price_lines_are_dropped() {
        let quote = QuoteParser::new(AmountBasis::UnitPrice)
            .with_today(today())
            .parse("Items:\n99999999999999999999 x A @ 99999999999999999999\n2 x B @ 5");

        assert_eq!(quote.items().len(), 1);
        assert_eq!(quote.items()[0].description, "B");
        assert_eq!(quote.total(), Decimal::from(10));
    }

    #[test]
    fn lines_that_overflow_the_sum_are_dropped() {
        let quote = parser().parse(
            "Items:\n1; A; 79228162514264337593543950335\n1; B; 79228162514264337593543950335",
        );

        assert_eq!(quote.items().len(), 1);
        assert_eq!(quote.subtotal(), Decimal::MAX);
    }

    #[test]
    fn parsing_is_deterministic() {
        assert_eq!(parser().parse(TEMPLATE), parser().parse(TEMPLATE));
        let first = parse_quote_text("Items:\n1; A; 1");
        let second = parse_quote_text("Items:\n1; A; 1");
        assert_eq!(first.items(), second.items());
        assert_eq!(first.total(), second.total());
    }
}
