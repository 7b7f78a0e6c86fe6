//! The shape the conversational layer hands over when it wants a document.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::dates::format_short_date;
use crate::domain::quote::Quote;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuoteId(pub String);

impl QuoteId {
    /// `COT-<unix millis>`.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self(format!("COT-{}", now.timestamp_millis()))
    }
}

/// One cart row: name, quantity and what the whole line costs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    pub name: String,
    #[serde(default)]
    pub quantity: Decimal,
    #[serde(default)]
    pub line_amount: Decimal,
}

/// Overrides typed by the user next to the cart.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteNote {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub total: Option<Decimal>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteSession {
    #[serde(default)]
    pub profile_name: String,
    #[serde(default)]
    pub cart: Vec<CartEntry>,
    #[serde(default)]
    pub note: QuoteNote,
}

impl QuoteSession {
    /// Flattens a parsed quote into a session. Cart amounts are line totals
    /// whatever basis the quote was parsed with.
    pub fn from_quote(quote: &Quote) -> Self {
        let cart = quote
            .items()
            .iter()
            .map(|item| CartEntry {
                name: item.description.clone(),
                quantity: item.quantity,
                line_amount: item.line_total(quote.basis()),
            })
            .collect();

        Self {
            profile_name: quote.client_name().to_string(),
            cart,
            note: QuoteNote {
                date: Some(format_short_date(quote.date())),
                description: quote.description().to_string(),
                total: Some(quote.total()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::{QuoteId, QuoteSession};
    use crate::domain::quote::{AmountBasis, LineItem, Quote, QuoteHeader};

    #[test]
    fn session_carries_resolved_line_totals() {
        let quote = Quote::new(
            QuoteHeader {
                client_name: "Eco".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 5, 2).expect("valid date"),
                description: "Feria".to_string(),
                message: String::new(),
            },
            AmountBasis::UnitPrice,
            vec![LineItem::new(Decimal::from(3), "Bidón 20L", Decimal::from(150))],
            None,
        );

        let session = QuoteSession::from_quote(&quote);

        assert_eq!(session.profile_name, "Eco");
        assert_eq!(session.cart.len(), 1);
        assert_eq!(session.cart[0].line_amount, Decimal::from(450));
        assert_eq!(session.note.date.as_deref(), Some("02/05/2024"));
        assert_eq!(session.note.total, Some(Decimal::from(450)));
    }

    #[test]
    fn session_deserializes_with_missing_fields() {
        let session: QuoteSession = serde_json::from_str(
            r#"{"profile_name":"ACME","cart":[{"name":"Logo","quantity":"2","line_amount":"350"}]}"#,
        )
        .expect("session json");

        assert_eq!(session.cart[0].quantity, Decimal::from(2));
        assert_eq!(session.note, Default::default());
    }

    #[test]
    fn quote_id_uses_unix_millis() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).single().expect("valid instant");
        assert_eq!(QuoteId::at(now).0, "COT-1700000000123");
    }
}
