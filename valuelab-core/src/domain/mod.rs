//! Domain types: tickers, statements, quotes, price bars.

pub mod bar;
pub mod country;
pub mod quote;
pub mod statement;
pub mod ticker;

pub use bar::{adjusted_closes, DailyBar};
pub use country::{Country, DEFAULT_BENCHMARK};
pub use quote::QuoteSnapshot;
pub use statement::{FinancialStatementYear, LineItem, StatementHistory};
pub use ticker::{Ticker, TickerError};
