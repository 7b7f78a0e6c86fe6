//! The renderer's own view of a quote, mapped from either a parsed [`Quote`]
//! or a bot-layer [`QuoteSession`].

use chrono::NaiveDate;
use cotiza_core::dates::parse_flexible_date;
use cotiza_core::{Quote, QuoteSession};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One table row. `amount` is what the whole line costs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderItem {
    pub quantity: Decimal,
    pub description: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderQuote {
    pub client_name: String,
    pub date: NaiveDate,
    pub description: String,
    pub items: Vec<RenderItem>,
    /// When absent, the total row shows the sum of the rendered rows.
    pub explicit_total: Option<Decimal>,
}

impl RenderQuote {
    pub fn from_quote(quote: &Quote) -> Self {
        let items = quote
            .items()
            .iter()
            .map(|item| RenderItem {
                quantity: item.quantity,
                description: item.description.clone(),
                amount: item.line_total(quote.basis()),
            })
            .collect();

        Self {
            client_name: quote.client_name().to_string(),
            date: quote.date(),
            description: quote.description().to_string(),
            items,
            explicit_total: quote.explicit_total(),
        }
    }

    /// Resolves a session; an unparseable note date becomes `today` and a zero
    /// note total counts as no total.
    pub fn from_session(session: &QuoteSession, today: NaiveDate) -> Self {
        let items = session
            .cart
            .iter()
            .map(|entry| RenderItem {
                quantity: entry.quantity,
                description: entry.name.clone(),
                amount: entry.line_amount,
            })
            .collect();

        Self {
            client_name: session.profile_name.clone(),
            date: session.note.date.as_deref().and_then(parse_flexible_date).unwrap_or(today),
            description: session.note.description.clone(),
            items,
            explicit_total: session.note.total.filter(|total| !total.is_zero()),
        }
    }
}
