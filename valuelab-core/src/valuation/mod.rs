//! DCF valuation stages.
//!
//! Each stage is a pure function over immutable inputs:
//! statements → free cash flows → growth rate → projection → equity bridge →
//! recommendation, with the cost of capital computed alongside from the
//! statements and annual returns.

pub mod aggregate;
pub mod cost_of_capital;
pub mod error;
pub mod fcf;
pub mod growth;
pub mod projection;
pub mod recommendation;
pub mod returns;
pub mod suitability;

pub use aggregate::{aggregate, equity_value, fair_value_per_share, EquityBridge, EQUITY_FLOOR};
pub use cost_of_capital::{
    capital_structure, compute_cost_of_capital, cost_of_debt, credit_spread, interest_coverage,
    tax_rate, CapitalStructure, CostOfCapital, CostOfDebt, CostOfEquity, COVERAGE_BREAKPOINTS,
};
pub use error::ValuationError;
pub use fcf::{estimate_free_cash_flows, FreeCashFlowEstimate, FreeCashFlowSeries, FreeCashFlowYear};
pub use growth::{select_growth_rate, GrowthBranch, GrowthRate};
pub use projection::{
    discount_factor, gordon_growth_rate, project, Projection, ProjectionYear, TerminalDiscounting,
    TerminalValue, PROJECTION_YEARS,
};
pub use recommendation::{assess, conclude, recommend, Conclusion, Recommendation};
pub use returns::{annual_returns, mean_annual_return, AnnualReturn};
pub use suitability::{check_suitability, Suitability};

use crate::domain::{LineItem, StatementHistory};

/// Value of `item` in fiscal year `year`, or a domain mismatch when the
/// company does not report it.
pub(crate) fn require(
    history: &StatementHistory,
    year: usize,
    item: LineItem,
) -> Result<f64, ValuationError> {
    history
        .get(year, item)
        .ok_or(ValuationError::DomainMismatch { item, year })
}

/// Reject NaN and infinities before they leak into later stages.
pub(crate) fn finite(quantity: &'static str, value: f64) -> Result<f64, ValuationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValuationError::degenerate(
            quantity,
            format!("non-finite value {value}"),
        ))
    }
}
