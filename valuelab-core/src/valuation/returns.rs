//! Annual returns from daily prices.
//!
//! Daily prices are resampled to calendar-year ends: each year takes its last
//! observation, and a year with no observations carries the previous year's
//! value forward. Year-over-year percentage changes follow, with the leading
//! undefined value dropped.

use super::ValuationError;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnualReturn {
    pub year: i32,
    pub value: f64,
}

/// Calendar-year returns from `(date, price)` observations in any order.
pub fn annual_returns(prices: &[(NaiveDate, f64)]) -> Result<Vec<AnnualReturn>, ValuationError> {
    let mut sorted: Vec<(NaiveDate, f64)> = prices
        .iter()
        .copied()
        .filter(|(_, p)| p.is_finite())
        .collect();
    sorted.sort_by_key(|(d, _)| *d);

    let mut year_end: BTreeMap<i32, f64> = BTreeMap::new();
    for (date, price) in &sorted {
        year_end.insert(date.year(), *price);
    }

    let (Some(&first), Some(&last)) = (year_end.keys().next(), year_end.keys().next_back()) else {
        return Ok(Vec::new());
    };

    let mut resampled = Vec::with_capacity((last - first + 1) as usize);
    let mut carried = year_end[&first];
    for year in first..=last {
        if let Some(&price) = year_end.get(&year) {
            carried = price;
        }
        resampled.push((year, carried));
    }

    resampled
        .windows(2)
        .map(|w| {
            let (_, prev) = w[0];
            let (year, cur) = w[1];
            if prev == 0.0 {
                return Err(ValuationError::degenerate(
                    "annual return",
                    format!("zero year-end price before {year}"),
                ));
            }
            Ok(AnnualReturn {
                year,
                value: cur / prev - 1.0,
            })
        })
        .collect()
}

/// Arithmetic mean of the annual returns of `symbol`'s price history.
pub fn mean_annual_return(
    symbol: &str,
    prices: &[(NaiveDate, f64)],
) -> Result<f64, ValuationError> {
    let returns = annual_returns(prices)?;
    if returns.is_empty() {
        let years = prices
            .iter()
            .map(|(d, _)| d.year())
            .collect::<std::collections::BTreeSet<_>>()
            .len();
        return Err(ValuationError::EmptyReturnSeries {
            symbol: symbol.to_string(),
            years,
        });
    }
    Ok(returns.iter().map(|r| r.value).sum::<f64>() / returns.len() as f64)
}
