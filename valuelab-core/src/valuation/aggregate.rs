//! Enterprise value to fair value per share.

use super::projection::Projection;
use super::{finite, require, ValuationError};
use crate::domain::{LineItem, StatementHistory};
use serde::{Deserialize, Serialize};

/// Equity value used when the bridge produces zero or less. A fair value of
/// exactly zero is never reported.
pub const EQUITY_FLOOR: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityBridge {
    pub enterprise_value: f64,
    pub cash: f64,
    pub long_term_debt: f64,
    pub equity_value: f64,
    /// True when the raw equity value was replaced by the floor.
    pub floored: bool,
    pub shares_outstanding: f64,
    pub fair_value_per_share: f64,
}

/// `EV + cash - long-term debt`, replaced by the floor unless strictly
/// positive. Returns the value and whether the floor applied.
pub fn equity_value(enterprise_value: f64, cash: f64, long_term_debt: f64) -> (f64, bool) {
    let raw = enterprise_value + cash - long_term_debt;
    if raw > 0.0 {
        (raw, false)
    } else {
        (EQUITY_FLOOR, true)
    }
}

/// Equity value per share, rounded to cents.
pub fn fair_value_per_share(equity_value: f64, shares_outstanding: f64) -> Result<f64, ValuationError> {
    if shares_outstanding.is_nan() || shares_outstanding <= 0.0 {
        return Err(ValuationError::degenerate(
            "fair value per share",
            format!("shares outstanding is {shares_outstanding}"),
        ));
    }
    let per_share = finite("fair value per share", equity_value / shares_outstanding)?;
    Ok(round_cents(per_share))
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Sum the discounted entries and bridge to a per-share value using the
/// latest balance sheet.
pub fn aggregate(
    projection: &Projection,
    history: &StatementHistory,
    shares_outstanding: f64,
) -> Result<EquityBridge, ValuationError> {
    let enterprise_value = finite(
        "enterprise value",
        projection.discounted_entries().iter().sum(),
    )?;
    let cash = require(history, 0, LineItem::Cash)?;
    let long_term_debt = require(history, 0, LineItem::LongTermDebt)?;

    let (equity_value, floored) = equity_value(enterprise_value, cash, long_term_debt);
    let fair_value_per_share = fair_value_per_share(equity_value, shares_outstanding)?;

    Ok(EquityBridge {
        enterprise_value,
        cash,
        long_term_debt,
        equity_value,
        floored,
        shares_outstanding,
        fair_value_per_share,
    })
}
