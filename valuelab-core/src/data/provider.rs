//! Provider traits and structured data errors.
//!
//! The valuation needs three feeds: annual statement line items, quote
//! fields, and daily price bars. `FinancialHistoryProvider` covers the first
//! two, `MarketDataProvider` the third. Yahoo Finance implements both, as does
//! the offline bundle reader; tests substitute in-memory fakes.

use crate::domain::{DailyBar, QuoteSnapshot, StatementHistory, Ticker};
use crate::error::ErrorKind;
use chrono::NaiveDate;
use thiserror::Error;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("no price data for '{symbol}' between {start} and {end}")]
    EmptySeries {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("no annual fundamentals reported for '{symbol}'")]
    NoFundamentals { symbol: String },

    #[error("bundle error: {0}")]
    Bundle(String),

    #[error("data error: {0}")]
    Other(String),
}

impl DataError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DataError::SymbolNotFound { .. } => ErrorKind::InputValidation,
            DataError::NoFundamentals { .. } => ErrorKind::DomainMismatch,
            _ => ErrorKind::UpstreamData,
        }
    }
}

/// Behaviour shared by every provider.
pub trait Provider: Send + Sync {
    /// Human-readable name of this provider, used in logs and reports.
    fn name(&self) -> &str;

    /// Whether the provider is currently accepting requests.
    fn is_available(&self) -> bool {
        true
    }
}

/// Statements and quote fields for a single company.
pub trait FinancialHistoryProvider: Provider {
    /// Current quote fields. An unknown ticker is `SymbolNotFound`.
    fn fetch_quote(&self, ticker: &Ticker) -> Result<QuoteSnapshot, DataError>;

    /// Annual statements, most recent fiscal year first.
    fn fetch_financials(&self, ticker: &Ticker) -> Result<StatementHistory, DataError>;
}

/// Daily price history for stocks and indices.
pub trait MarketDataProvider: Provider {
    /// Daily bars for `symbol` in `[start, end]`, ascending by date.
    /// An empty window is `EmptySeries`.
    fn fetch_daily_prices(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, DataError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_symbol_is_input_validation() {
        let e = DataError::SymbolNotFound {
            symbol: "ZZZZ".into(),
        };
        assert_eq!(e.kind(), ErrorKind::InputValidation);
        assert_eq!(DataError::CircuitBreakerTripped.kind(), ErrorKind::UpstreamData);
        let etf = DataError::NoFundamentals {
            symbol: "SPY".into(),
        };
        assert_eq!(etf.kind(), ErrorKind::DomainMismatch);
    }
}
