//! Input fingerprinting.
//!
//! A BLAKE3 digest over everything the valuation reads from its providers
//! (quote fields, statement line items, and the price observations used for
//! returns). Two runs with the same fingerprint and configuration produce
//! the same fair value.

use crate::domain::{LineItem, QuoteSnapshot, StatementHistory};
use chrono::NaiveDate;

/// Incremental fingerprint builder. Feed inputs in a fixed order.
pub struct InputFingerprint {
    hasher: blake3::Hasher,
}

impl Default for InputFingerprint {
    fn default() -> Self {
        Self::new()
    }
}

impl InputFingerprint {
    pub fn new() -> Self {
        Self {
            hasher: blake3::Hasher::new(),
        }
    }

    pub fn quote(mut self, quote: &QuoteSnapshot) -> Self {
        self.hasher.update(b"quote");
        self.hasher.update(quote.ticker.as_str().as_bytes());
        self.hasher.update(quote.currency.as_bytes());
        self.hasher.update(quote.country.name().as_bytes());
        self.hasher.update(&quote.previous_close.to_le_bytes());
        self.hasher.update(&quote.shares_outstanding.to_le_bytes());
        self.optional(quote.beta);
        self
    }

    pub fn statements(mut self, history: &StatementHistory) -> Self {
        self.hasher.update(b"statements");
        for year in history.years() {
            let end = year.period_end.map(|d| d.to_string()).unwrap_or_default();
            self.hasher.update(end.as_bytes());
            for item in LineItem::ALL {
                self.hasher.update(item.key().as_bytes());
                self.optional(year.get(item));
            }
        }
        self
    }

    pub fn prices(mut self, symbol: &str, prices: &[(NaiveDate, f64)]) -> Self {
        self.hasher.update(b"prices");
        self.hasher.update(symbol.as_bytes());
        for (date, price) in prices {
            self.hasher.update(date.to_string().as_bytes());
            self.hasher.update(&price.to_le_bytes());
        }
        self
    }

    pub fn finish(self) -> String {
        self.hasher.finalize().to_hex().to_string()
    }

    fn optional(&mut self, value: Option<f64>) {
        match value {
            Some(v) => {
                self.hasher.update(&[1]);
                self.hasher.update(&v.to_le_bytes());
            }
            None => {
                self.hasher.update(&[0]);
            }
        }
    }
}
