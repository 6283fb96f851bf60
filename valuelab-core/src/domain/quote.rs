//! Current quote fields for the company being valued.

use super::country::Country;
use super::ticker::Ticker;
use serde::{Deserialize, Serialize};

/// Scalar quote fields needed alongside the statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub ticker: Ticker,
    pub short_name: String,
    /// Previous session close, used as the current share price.
    pub previous_close: f64,
    pub shares_outstanding: f64,
    pub currency: String,
    pub country: Country,
    /// Absent for recently listed or thinly covered names.
    pub beta: Option<f64>,
}

impl QuoteSnapshot {
    pub fn benchmark_symbol(&self) -> &'static str {
        self.country.benchmark_symbol()
    }
}
