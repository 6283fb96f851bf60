//! Error classes shared by every layer.
//!
//! Each concrete error enum (`DataError`, `ValuationError`, `TickerError`, and
//! the runner's `PipelineError`) maps onto one of these classes so the CLI can
//! decide whether to re-prompt, reject the ticker, or stop.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The user typed something that does not name a listed company.
    /// Recoverable by asking again.
    InputValidation,
    /// The company does not report what a DCF needs (banks, insurers).
    DomainMismatch,
    /// The data provider failed or returned too little data.
    UpstreamData,
    /// A division by zero or non-finite intermediate value.
    ArithmeticDegeneracy,
    /// Bad configuration file or environment override.
    Configuration,
}

impl ErrorKind {
    pub fn is_retryable_by_user(self) -> bool {
        self == ErrorKind::InputValidation
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InputValidation => "input validation",
            ErrorKind::DomainMismatch => "domain mismatch",
            ErrorKind::UpstreamData => "upstream data",
            ErrorKind::ArithmeticDegeneracy => "arithmetic degeneracy",
            ErrorKind::Configuration => "configuration",
        };
        f.write_str(s)
    }
}
