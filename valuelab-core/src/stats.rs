//! Descriptive statistics of recent trading history.
//!
//! Pure functions: bars in, summary out. Variance and standard deviation use
//! the sample (n - 1) estimator.

use crate::domain::DailyBar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: f64,
    /// `None` with fewer than two observations.
    pub variance: Option<f64>,
    pub std_dev: Option<f64>,
    pub max: f64,
    pub min: f64,
}

/// Summary of one column of prices or volumes. Non-finite values are skipped;
/// `None` when nothing is left.
pub fn describe(values: &[f64]) -> Option<DescriptiveStats> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }

    let n = finite.len();
    let mean = finite.iter().sum::<f64>() / n as f64;
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);

    let variance = (n > 1).then(|| {
        finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64
    });

    Some(DescriptiveStats {
        count: n,
        mean,
        variance,
        std_dev: variance.map(f64::sqrt),
        max,
        min,
    })
}

/// Per-column statistics over a date window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub open: Option<DescriptiveStats>,
    pub high: Option<DescriptiveStats>,
    pub low: Option<DescriptiveStats>,
    pub close: Option<DescriptiveStats>,
    pub adj_close: Option<DescriptiveStats>,
    pub volume: Option<DescriptiveStats>,
}

impl PriceSummary {
    /// Rows in display order.
    pub fn rows(&self) -> [(&'static str, Option<DescriptiveStats>); 6] {
        [
            ("Open", self.open),
            ("High", self.high),
            ("Low", self.low),
            ("Close", self.close),
            ("Adj Close", self.adj_close),
            ("Volume", self.volume),
        ]
    }
}

/// Summarise the bars dated within `[start, end]`.
pub fn summarize_prices(bars: &[DailyBar], start: NaiveDate, end: NaiveDate) -> PriceSummary {
    let window: Vec<&DailyBar> = bars
        .iter()
        .filter(|b| b.date >= start && b.date <= end)
        .collect();

    let column = |f: fn(&DailyBar) -> f64| -> Option<DescriptiveStats> {
        let values: Vec<f64> = window.iter().map(|b| f(b)).collect();
        describe(&values)
    };

    PriceSummary {
        start,
        end,
        open: column(|b| b.open),
        high: column(|b| b.high),
        low: column(|b| b.low),
        close: column(|b| b.close),
        adj_close: column(|b| b.adj_close),
        volume: column(|b| b.volume as f64),
    }
}
