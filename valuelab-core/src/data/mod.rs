//! Data providers: Yahoo Finance over HTTP and an offline bundle on disk.

pub mod circuit_breaker;
pub mod local;
pub mod provider;
pub mod yahoo;

pub use circuit_breaker::CircuitBreaker;
pub use local::LocalBundleProvider;
pub use provider::{DataError, FinancialHistoryProvider, MarketDataProvider, Provider};
pub use yahoo::{YahooOptions, YahooProvider};
