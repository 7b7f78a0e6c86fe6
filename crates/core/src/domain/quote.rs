use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::dates::format_short_date;
use crate::money::{format_money, format_quantity, round_cents, CURRENCY};

/// How the trailing number of an item line is interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountBasis {
    /// The number is what the whole line costs (registered-quote path).
    #[default]
    LineSubtotal,
    /// The number is a unit price; the line costs `quantity * amount`.
    UnitPrice,
}

impl std::str::FromStr for AmountBasis {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "line" | "line_subtotal" | "subtotal" => Ok(Self::LineSubtotal),
            "unit" | "unit_price" => Ok(Self::UnitPrice),
            other => Err(format!("unsupported amount basis `{other}` (expected line|unit)")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub quantity: Decimal,
    pub description: String,
    pub amount: Decimal,
}

impl LineItem {
    pub fn new(quantity: Decimal, description: impl Into<String>, amount: Decimal) -> Self {
        Self { quantity, description: description.into(), amount }
    }

    /// Monetary value of the whole line under `basis`. Not rounded.
    /// Saturates at the decimal range instead of overflowing.
    pub fn line_total(&self, basis: AmountBasis) -> Decimal {
        match basis {
            AmountBasis::LineSubtotal => self.amount,
            AmountBasis::UnitPrice => self.quantity.saturating_mul(self.amount),
        }
    }

    /// `None` when quantity times unit price leaves the decimal range.
    pub fn checked_line_total(&self, basis: AmountBasis) -> Option<Decimal> {
        match basis {
            AmountBasis::LineSubtotal => Some(self.amount),
            AmountBasis::UnitPrice => self.quantity.checked_mul(self.amount),
        }
    }
}

/// Labelled fields of a quote, already resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuoteHeader {
    pub client_name: String,
    pub date: NaiveDate,
    pub description: String,
    pub message: String,
}

/// A parsed quote. Built once through [`Quote::new`], which derives the
/// subtotal and the authoritative total; read-only afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Quote {
    client_name: String,
    date: NaiveDate,
    description: String,
    message: String,
    basis: AmountBasis,
    items: Vec<LineItem>,
    subtotal: Decimal,
    explicit_total: Option<Decimal>,
    total: Decimal,
    currency: &'static str,
}

impl Quote {
    pub fn new(
        header: QuoteHeader,
        basis: AmountBasis,
        items: Vec<LineItem>,
        explicit_total: Option<Decimal>,
    ) -> Self {
        let subtotal = round_cents(
            items
                .iter()
                .map(|item| item.line_total(basis))
                .fold(Decimal::ZERO, Decimal::saturating_add),
        );
        let explicit_total = explicit_total.map(round_cents);
        let total = explicit_total.unwrap_or(subtotal);

        Self {
            client_name: header.client_name,
            date: header.date,
            description: header.description,
            message: header.message,
            basis,
            items,
            subtotal,
            explicit_total,
            total,
            currency: CURRENCY,
        }
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn basis(&self) -> AmountBasis {
        self.basis
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn subtotal(&self) -> Decimal {
        self.subtotal
    }

    /// The total typed by the user, when there was one.
    pub fn explicit_total(&self) -> Option<Decimal> {
        self.explicit_total
    }

    /// Explicit total if present, otherwise the subtotal.
    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn currency(&self) -> &'static str {
        self.currency
    }

    /// Plain-text recap sent alongside the rendered document.
    pub fn summary(&self) -> String {
        let client = if self.client_name.is_empty() { "—" } else { self.client_name.as_str() };
        let mut lines = vec![
            "Cotización de servicios".to_string(),
            format!("Empresa: {client}"),
            format!("Fecha: {}", format_short_date(self.date)),
        ];
        if !self.description.is_empty() {
            lines.push(format!("\nDescripción:\n{}", self.description));
        }
        if !self.message.is_empty() {
            lines.push(format!("Mensaje: {}", self.message));
        }
        lines.push("\nItems:".to_string());
        for item in &self.items {
            lines.push(format!(
                "• {} {} — Bs {}",
                format_quantity(item.quantity),
                item.description,
                format_money(item.line_total(self.basis))
            ));
        }
        lines.push(format!("\nSubtotal: Bs {}", format_money(self.subtotal)));
        lines.push(format!("Total: Bs {}", format_money(self.total)));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{AmountBasis, LineItem, Quote, QuoteHeader};

    fn header() -> QuoteHeader {
        QuoteHeader {
            client_name: "ACME".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 15).expect("valid date"),
            description: String::new(),
            message: String::new(),
        }
    }

    #[test]
    fn subtotal_is_rounded_once_on_the_sum() {
        let quote = Quote::new(
            header(),
            AmountBasis::LineSubtotal,
            vec![
                LineItem::new(Decimal::from(2), "A", Decimal::new(10005, 3)),
                LineItem::new(Decimal::from(1), "B", Decimal::new(500, 2)),
            ],
            None,
        );

        assert_eq!(quote.subtotal(), Decimal::new(1501, 2));
        assert_eq!(quote.total(), Decimal::new(1501, 2));
        assert_eq!(quote.explicit_total(), None);
    }

    #[test]
    fn explicit_total_wins_over_item_sum() {
        let quote = Quote::new(
            header(),
            AmountBasis::LineSubtotal,
            vec![LineItem::new(Decimal::from(1), "A", Decimal::from(300))],
            Some(Decimal::from(500)),
        );

        assert_eq!(quote.subtotal(), Decimal::from(300));
        assert_eq!(quote.total(), Decimal::from(500));
    }

    #[test]
    fn unit_price_basis_multiplies_by_quantity() {
        let item = LineItem::new(Decimal::new(25, 1), "Horas", Decimal::from(100));
        assert_eq!(item.line_total(AmountBasis::LineSubtotal), Decimal::from(100));
        assert_eq!(item.line_total(AmountBasis::UnitPrice), Decimal::from(250));

        let quote = Quote::new(header(), AmountBasis::UnitPrice, vec![item], None);
        assert_eq!(quote.subtotal(), Decimal::from(250));
    }

    #[test]
    fn out_of_range_amounts_saturate_instead_of_panicking() {
        let huge = LineItem::new(Decimal::MAX, "A", Decimal::MAX);
        assert_eq!(huge.checked_line_total(AmountBasis::UnitPrice), None);
        assert_eq!(huge.line_total(AmountBasis::UnitPrice), Decimal::MAX);

        let quote = Quote::new(header(), AmountBasis::LineSubtotal, vec![huge.clone(), huge], None);
        assert_eq!(quote.subtotal(), Decimal::MAX);
    }

    #[test]
    fn empty_quote_totals_zero() {
        let quote = Quote::new(header(), AmountBasis::LineSubtotal, Vec::new(), None);
        assert_eq!(quote.subtotal(), Decimal::ZERO);
        assert_eq!(quote.total(), Decimal::ZERO);
        assert_eq!(quote.currency(), "BOB");
    }

    #[test]
    fn summary_lists_items_and_totals() {
        let quote = Quote::new(
            header(),
            AmountBasis::LineSubtotal,
            vec![LineItem::new(Decimal::from(2), "Diseño de logo", Decimal::from(350))],
            None,
        );
        let summary = quote.summary();

        assert!(summary.contains("Empresa: ACME"));
        assert!(summary.contains("Fecha: 15/01/2024"));
        assert!(summary.contains("• 2 Diseño de logo — Bs 350.00"));
        assert!(summary.ends_with("Total: Bs 350.00"));
    }
}
