//! Daily price bars.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading day of OHLCV data as delivered by a market data provider.
///
/// Missing prices are carried as NaN; consumers skip non-finite values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: u64,
}

impl DailyBar {
    /// Adjusted close, falling back to the raw close when the provider has
    /// no adjustment for the day.
    pub fn price(&self) -> f64 {
        if self.adj_close.is_finite() {
            self.adj_close
        } else {
            self.close
        }
    }
}

/// `(date, price)` pairs for the bars with a finite price, in input order.
pub fn adjusted_closes(bars: &[DailyBar]) -> Vec<(NaiveDate, f64)> {
    bars.iter()
        .filter_map(|b| {
            let p = b.price();
            p.is_finite().then_some((b.date, p))
        })
        .collect()
}
