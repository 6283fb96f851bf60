//! Weighted average cost of capital.
//!
//! - Capital structure from the latest balance sheet.
//! - Cost of equity from CAPM, or a historical mean return when no beta is
//!   published.
//! - Cost of debt as the risk-free rate plus a credit spread looked up from
//!   the interest coverage ratio.
//! - Tax shield from the latest effective tax rate.

use super::fcf::FCF_YEARS;
use super::{finite, require, ValuationError};
use crate::domain::{LineItem, StatementHistory};
use serde::{Deserialize, Serialize};

/// Interest coverage breakpoints, descending. The spread for a ratio is
/// `(10 - b) / 100` for the first breakpoint `b` the ratio strictly exceeds.
pub const COVERAGE_BREAKPOINTS: [f64; 14] = [
    8.50, 6.50, 5.50, 4.25, 3.00, 2.50, 2.25, 2.00, 1.75, 1.50, 1.25, 0.80, 0.65, 0.20,
];

/// Spread applied when coverage is below every breakpoint.
pub const WORST_CASE_SPREAD: f64 = 0.15;

/// Equity and liabilities as fractions of total assets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapitalStructure {
    pub equity_ratio: f64,
    pub debt_ratio: f64,
}

impl CapitalStructure {
    /// Data-quality findings. Never fatal and never clamped.
    pub fn warnings(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.equity_ratio < 0.0 {
            out.push(format!(
                "negative equity ratio {:.4} (stockholder equity below zero)",
                self.equity_ratio
            ));
        }
        if self.debt_ratio < 0.0 {
            out.push(format!("negative debt ratio {:.4}", self.debt_ratio));
        }
        let total = self.equity_ratio + self.debt_ratio;
        if total > 1.0 + 1e-9 {
            out.push(format!(
                "equity and debt ratios sum to {total:.4}, above total assets"
            ));
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CostOfEquity {
    /// `r_f + beta * (market_return - r_f)`.
    Capm {
        beta: f64,
        market_return: f64,
        rate: f64,
    },
    /// Mean annual return of `symbol`, used when no beta is published.
    HistoricalMean { symbol: String, rate: f64 },
}

impl CostOfEquity {
    pub fn capm(risk_free: f64, beta: f64, market_return: f64) -> Self {
        CostOfEquity::Capm {
            beta,
            market_return,
            rate: risk_free + beta * (market_return - risk_free),
        }
    }

    pub fn historical(symbol: impl Into<String>, mean_return: f64) -> Self {
        CostOfEquity::HistoricalMean {
            symbol: symbol.into(),
            rate: mean_return,
        }
    }

    pub fn rate(&self) -> f64 {
        match self {
            CostOfEquity::Capm { rate, .. } | CostOfEquity::HistoricalMean { rate, .. } => *rate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostOfDebt {
    pub coverage_ratio: f64,
    pub spread: f64,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostOfCapital {
    pub risk_free_rate: f64,
    pub capital_structure: CapitalStructure,
    pub cost_of_equity: CostOfEquity,
    pub cost_of_debt: CostOfDebt,
    pub tax_rate: f64,
    pub wacc: f64,
}

impl CostOfCapital {
    pub fn tax_shield(&self) -> f64 {
        1.0 - self.tax_rate
    }
}

// ─── Individual components ──────────────────────────────────────────

pub fn capital_structure(history: &StatementHistory) -> Result<CapitalStructure, ValuationError> {
    let equity = require(history, 0, LineItem::TotalStockholderEquity)?;
    let liabilities = require(history, 0, LineItem::TotalLiabilities)?;
    let assets = require(history, 0, LineItem::TotalAssets)?;
    if assets == 0.0 {
        return Err(ValuationError::degenerate(
            "capital structure",
            "total assets are zero",
        ));
    }
    Ok(CapitalStructure {
        equity_ratio: finite("equity ratio", equity / assets)?,
        debt_ratio: finite("debt ratio", liabilities / assets)?,
    })
}

/// `|mean(EBIT) / mean(interest expense)|` over the three latest years.
///
/// A company with no interest expense has unbounded coverage and lands in
/// the best tier.
pub fn interest_coverage(history: &StatementHistory) -> Result<f64, ValuationError> {
    let mut ebit_sum = 0.0;
    let mut interest_sum = 0.0;
    for y in 0..FCF_YEARS {
        ebit_sum += require(history, y, LineItem::Ebit)?;
        interest_sum += require(history, y, LineItem::InterestExpense)?;
    }
    let avg_ebit = ebit_sum / FCF_YEARS as f64;
    let avg_interest = interest_sum / FCF_YEARS as f64;

    if avg_interest == 0.0 {
        return Ok(f64::INFINITY);
    }
    Ok((avg_ebit / avg_interest).abs())
}

/// Credit spread for an interest coverage ratio.
pub fn credit_spread(coverage: f64) -> f64 {
    COVERAGE_BREAKPOINTS
        .iter()
        .find(|&&b| coverage > b)
        .map(|b| (10.0 - b) / 100.0)
        .unwrap_or(WORST_CASE_SPREAD)
}

pub fn cost_of_debt(history: &StatementHistory, risk_free: f64) -> Result<CostOfDebt, ValuationError> {
    let coverage_ratio = interest_coverage(history)?;
    let spread = credit_spread(coverage_ratio);
    Ok(CostOfDebt {
        coverage_ratio,
        spread,
        rate: risk_free + spread,
    })
}

/// `tax / (EBIT - interest)` for the latest fiscal year.
pub fn tax_rate(history: &StatementHistory) -> Result<f64, ValuationError> {
    let tax = require(history, 0, LineItem::TaxExpense)?;
    let ebit = require(history, 0, LineItem::Ebit)?;
    let interest = require(history, 0, LineItem::InterestExpense)?;
    let pretax = ebit - interest;
    if pretax == 0.0 {
        return Err(ValuationError::degenerate(
            "tax rate",
            "EBIT equals interest expense (zero pre-tax income)",
        ));
    }
    finite("tax rate", tax / pretax)
}

/// Blend the components into a WACC.
pub fn compute_cost_of_capital(
    history: &StatementHistory,
    risk_free: f64,
    cost_of_equity: CostOfEquity,
) -> Result<CostOfCapital, ValuationError> {
    let structure = capital_structure(history)?;
    let debt = cost_of_debt(history, risk_free)?;
    let tax_rate = tax_rate(history)?;
    finite("cost of equity", cost_of_equity.rate())?;

    let wacc = finite(
        "WACC",
        cost_of_equity.rate() * structure.equity_ratio
            + debt.rate * structure.debt_ratio * (1.0 - tax_rate),
    )?;

    Ok(CostOfCapital {
        risk_free_rate: risk_free,
        capital_structure: structure,
        cost_of_equity,
        cost_of_debt: debt,
        tax_rate,
        wacc,
    })
}
