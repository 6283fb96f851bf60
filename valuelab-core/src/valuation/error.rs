//! Errors raised by the valuation stages.

use crate::domain::LineItem;
use crate::error::ErrorKind;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValuationError {
    #[error(
        "'{item}' is not reported for fiscal year {year} (0 = latest); \
         DCF valuation is not appropriate for this instrument"
    )]
    DomainMismatch { item: LineItem, year: usize },

    #[error("statement history has {available} fiscal years, {required} required")]
    InsufficientHistory { available: usize, required: usize },

    #[error("price history for '{symbol}' spans {years} calendar year(s); at least 2 needed for an annual return")]
    EmptyReturnSeries { symbol: String, years: usize },

    #[error("invalid quote field {field}: {value}")]
    InvalidQuote { field: &'static str, value: f64 },

    #[error("arithmetic degeneracy in {quantity}: {reason}")]
    Degenerate {
        quantity: &'static str,
        reason: String,
    },
}

impl ValuationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ValuationError::DomainMismatch { .. } => ErrorKind::DomainMismatch,
            ValuationError::InsufficientHistory { .. } | ValuationError::EmptyReturnSeries { .. } => {
                ErrorKind::UpstreamData
            }
            ValuationError::InvalidQuote { .. } => ErrorKind::InputValidation,
            ValuationError::Degenerate { .. } => ErrorKind::ArithmeticDegeneracy,
        }
    }

    pub(crate) fn degenerate(quantity: &'static str, reason: impl Into<String>) -> Self {
        ValuationError::Degenerate {
            quantity,
            reason: reason.into(),
        }
    }
}
