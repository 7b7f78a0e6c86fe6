//! Flat row handed to the external spreadsheet writer.

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::dates::format_short_date;
use crate::domain::quote::Quote;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuoteLogRecord {
    pub date: String,
    pub time: String,
    pub brand: String,
    pub client: String,
    pub description: String,
    pub item_count: usize,
    pub subtotal: Decimal,
    pub total: Decimal,
}

impl QuoteLogRecord {
    /// `now` is the logging instant in the configured offset, not the quote date.
    pub fn from_quote(quote: &Quote, brand: &str, now: DateTime<FixedOffset>) -> Self {
        Self {
            date: format_short_date(now.date_naive()),
            time: now.format("%H:%M").to_string(),
            brand: brand.to_string(),
            client: quote.client_name().to_string(),
            description: quote.description().to_string(),
            item_count: quote.items().len(),
            subtotal: quote.subtotal(),
            total: quote.total(),
        }
    }

    /// Cell values in column order.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.date.clone(),
            self.time.clone(),
            self.brand.clone(),
            self.client.clone(),
            self.description.clone(),
            self.item_count.to_string(),
            self.subtotal.to_string(),
            self.total.to_string(),
        ]
    }
}
