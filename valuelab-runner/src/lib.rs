//! ValueLab Runner: configuration, pipeline orchestration, reporting.
//!
//! This crate builds on `valuelab-core` to provide:
//! - TOML configuration with environment overrides
//! - The end-to-end valuation pipeline over any pair of providers
//! - The valuation report (JSON and plain text)
//! - Offline bundle export

pub mod config;
pub mod export;
pub mod pipeline;
pub mod report;

pub use config::{ConfigError, FallbackReturnSeries, ValuationConfig};
pub use export::{export_bundle, ExportSummary};
pub use pipeline::{check_ticker, run_valuation, PipelineError};
pub use report::ValuationReport;

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn report_is_send_sync() {
        assert_send::<ValuationReport>();
        assert_sync::<ValuationReport>();
    }

    #[test]
    fn config_is_send_sync() {
        assert_send::<ValuationConfig>();
        assert_sync::<ValuationConfig>();
    }

    #[test]
    fn pipeline_error_is_send_sync() {
        assert_send::<PipelineError>();
        assert_sync::<PipelineError>();
    }
}
