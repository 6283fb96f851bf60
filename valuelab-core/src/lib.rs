//! ValueLab Core: domain types, data providers, DCF valuation stages.
//!
//! - Domain types (tickers, annual statements, quotes, daily bars, domiciles)
//! - Data providers behind two traits: statements/quote and daily prices
//! - Pure valuation stages from free cash flow to the buy/hold/sell call
//! - Descriptive statistics of recent trading
//! - Input fingerprinting for reproducible reports

pub mod data;
pub mod domain;
pub mod error;
pub mod fingerprint;
pub mod stats;
pub mod valuation;

pub use error::ErrorKind;
