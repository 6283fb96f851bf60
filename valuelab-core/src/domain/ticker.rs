//! Validated equity ticker symbols.
//!
//! A `Ticker` is the user-facing identifier of the company being valued. It is
//! normalised to uppercase and restricted to the character set used by listed
//! equities on the supported exchanges (`AAPL`, `NESN.SW`, `BRK-B`, `7203.T`).
//! Index symbols such as `^GSPC` are not tickers; benchmarks are passed around
//! as plain strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum accepted ticker length after trimming.
pub const MAX_TICKER_LEN: usize = 15;

/// Errors raised when user input does not name a valid ticker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TickerError {
    #[error("ticker is empty")]
    Empty,

    #[error("ticker is {len} characters long (max {max})")]
    TooLong { len: usize, max: usize },

    #[error("invalid character '{ch}' at position {index} in ticker")]
    InvalidChar { ch: char, index: usize },

    #[error("ticker must start with a letter or digit, found '{ch}'")]
    InvalidStart { ch: char },
}

/// Uppercase, syntactically valid equity ticker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    /// Parse and normalise a ticker typed by the user.
    pub fn parse(input: &str) -> Result<Self, TickerError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(TickerError::Empty);
        }

        let normalized = trimmed.to_ascii_uppercase();
        let len = normalized.chars().count();
        if len > MAX_TICKER_LEN {
            return Err(TickerError::TooLong {
                len,
                max: MAX_TICKER_LEN,
            });
        }

        if let Some(first) = normalized.chars().next() {
            if !first.is_ascii_alphanumeric() {
                return Err(TickerError::InvalidStart { ch: first });
            }
        }

        for (index, ch) in normalized.chars().enumerate() {
            if !(ch.is_ascii_alphanumeric() || ch == '.' || ch == '-') {
                return Err(TickerError::InvalidChar { ch, index });
            }
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Ticker {
    type Error = TickerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Ticker> for String {
    fn from(value: Ticker) -> Self {
        value.0
    }
}
