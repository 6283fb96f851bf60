//! Historical unlevered free cash flow.
//!
//! `FCF = EBIT - tax + D&A - CapEx - ΔNWC` for the three latest fiscal years,
//! where `NWC = receivables + inventory - payables` and
//! `ΔNWC(y) = NWC(y) - NWC(y + 1)`. The fourth year only feeds the working
//! capital delta of the third.

use super::{finite, require, ValuationError};
use crate::domain::{LineItem, StatementHistory};
use serde::{Deserialize, Serialize};

/// Number of historical free cash flows the pipeline works from.
pub const FCF_YEARS: usize = 3;

/// Fiscal years of statements required (one extra for the NWC delta).
pub const REQUIRED_STATEMENT_YEARS: usize = FCF_YEARS + 1;

/// Exactly three historical free cash flows, index 0 most recent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FreeCashFlowSeries([f64; FCF_YEARS]);

impl FreeCashFlowSeries {
    pub fn new(values: [f64; FCF_YEARS]) -> Self {
        Self(values)
    }

    pub fn latest(&self) -> f64 {
        self.0[0]
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    pub fn values(&self) -> &[f64; FCF_YEARS] {
        &self.0
    }
}

/// The components behind one year's free cash flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeCashFlowYear {
    pub ebit: f64,
    pub tax_expense: f64,
    pub depreciation_amortization: f64,
    pub capital_expenditure: f64,
    pub delta_nwc: f64,
    pub free_cash_flow: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeCashFlowEstimate {
    pub years: Vec<FreeCashFlowYear>,
    pub series: FreeCashFlowSeries,
}

/// `receivables + inventory - payables` for fiscal year `year`.
pub fn net_working_capital(history: &StatementHistory, year: usize) -> Result<f64, ValuationError> {
    let receivables = require(history, year, LineItem::NetReceivables)?;
    let inventory = require(history, year, LineItem::Inventory)?;
    let payables = require(history, year, LineItem::AccountsPayable)?;
    Ok(receivables + inventory - payables)
}

/// Derive the three latest free cash flows from four fiscal years of
/// statements.
pub fn estimate_free_cash_flows(
    history: &StatementHistory,
) -> Result<FreeCashFlowEstimate, ValuationError> {
    if history.len() < REQUIRED_STATEMENT_YEARS {
        return Err(ValuationError::InsufficientHistory {
            available: history.len(),
            required: REQUIRED_STATEMENT_YEARS,
        });
    }

    let mut years = Vec::with_capacity(FCF_YEARS);
    let mut values = [0.0; FCF_YEARS];

    for (y, slot) in values.iter_mut().enumerate() {
        let ebit = require(history, y, LineItem::Ebit)?;
        let tax_expense = require(history, y, LineItem::TaxExpense)?;
        let depreciation_amortization = require(history, y, LineItem::DepreciationAmortization)?;
        let capital_expenditure = require(history, y, LineItem::CapitalExpenditure)?;
        let delta_nwc = net_working_capital(history, y)? - net_working_capital(history, y + 1)?;

        let free_cash_flow = finite(
            "free cash flow",
            ebit - tax_expense + depreciation_amortization - capital_expenditure - delta_nwc,
        )?;

        *slot = free_cash_flow;
        years.push(FreeCashFlowYear {
            ebit,
            tax_expense,
            depreciation_amortization,
            capital_expenditure,
            delta_nwc,
            free_cash_flow,
        });
    }

    Ok(FreeCashFlowEstimate {
        years,
        series: FreeCashFlowSeries::new(values),
    })
}
