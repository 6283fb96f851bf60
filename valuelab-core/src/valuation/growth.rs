//! Forward growth rate selection.
//!
//! Two historical growth observations, `g1 = F0/F1 - 1` and `g2 = F1/F2 - 1`,
//! are reduced to one rate by a fixed, deliberately conservative policy:
//!
//! 1. `g1 > g2` and `g2 > 0`: take `g2` (positive but decelerating).
//! 2. otherwise `g1 <= 0.30`: take `g1`.
//! 3. otherwise: take `mean(g1, g2)` (`g1` is unrealistically high).
//!
//! Branch order and thresholds are policy, not tuning knobs.

use super::fcf::FreeCashFlowSeries;
use super::ValuationError;
use serde::{Deserialize, Serialize};

/// Latest growth above this is treated as unsustainable.
pub const HIGH_GROWTH_CEILING: f64 = 0.30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrowthBranch {
    /// Decelerating positive growth; the older, smaller rate was taken.
    Decelerating,
    /// The latest observation was taken.
    Latest,
    /// The latest observation exceeded the ceiling; both were averaged.
    Averaged,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthRate {
    pub rate: f64,
    pub g1: f64,
    pub g2: f64,
    pub branch: GrowthBranch,
}

fn growth(quantity: &'static str, current: f64, previous: f64) -> Result<f64, ValuationError> {
    if previous == 0.0 {
        return Err(ValuationError::degenerate(
            quantity,
            "previous free cash flow is zero",
        ));
    }
    super::finite(quantity, current / previous - 1.0)
}

pub fn select_growth_rate(fcf: &FreeCashFlowSeries) -> Result<GrowthRate, ValuationError> {
    let [f0, f1, f2] = *fcf.values();
    let g1 = growth("latest growth rate", f0, f1)?;
    let g2 = growth("prior growth rate", f1, f2)?;

    let (rate, branch) = if g1 > g2 && g2 > 0.0 {
        (g2, GrowthBranch::Decelerating)
    } else if g1 <= HIGH_GROWTH_CEILING {
        (g1, GrowthBranch::Latest)
    } else {
        ((g1 + g2) / 2.0, GrowthBranch::Averaged)
    };

    Ok(GrowthRate {
        rate,
        g1,
        g2,
        branch,
    })
}
