//! Snapshot provider data into an offline bundle.

use crate::config::ValuationConfig;
use crate::pipeline::{benchmark_unavailable, needs_benchmark, price_windows, PipelineError};
use chrono::NaiveDate;
use valuelab_core::data::{FinancialHistoryProvider, LocalBundleProvider, MarketDataProvider};
use valuelab_core::domain::{DailyBar, Ticker};

/// What `export_bundle` wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub ticker: Ticker,
    pub statement_years: usize,
    /// `(symbol, bar count)` per price series.
    pub series: Vec<(String, usize)>,
}

/// Fetch everything a valuation of `ticker` reads and store it under the
/// bundle root, so the run can be repeated offline. The benchmark series is
/// only fetched when the cost of equity uses it.
pub fn export_bundle(
    ticker: &Ticker,
    financials: &dyn FinancialHistoryProvider,
    market: &dyn MarketDataProvider,
    config: &ValuationConfig,
    today: NaiveDate,
    bundle: &LocalBundleProvider,
) -> Result<ExportSummary, PipelineError> {
    config.validate()?;

    let quote = financials.fetch_quote(ticker)?;
    let history = financials.fetch_financials(ticker)?;

    let benchmark = config
        .benchmark_override
        .clone()
        .unwrap_or_else(|| quote.benchmark_symbol().to_string());
    let (returns_start, summary_start) = price_windows(config, today);
    let start = returns_start.min(summary_start);

    let stock_bars = market.fetch_daily_prices(ticker.as_str(), start, today)?;
    let mut series = vec![(ticker.to_string(), stock_bars)];
    if needs_benchmark(&quote, config) {
        let bars = market
            .fetch_daily_prices(&benchmark, start, today)
            .map_err(benchmark_unavailable)?;
        series.push((benchmark, bars));
    }

    let prices: Vec<(&str, &[DailyBar])> = series
        .iter()
        .map(|(symbol, bars)| (symbol.as_str(), bars.as_slice()))
        .collect();
    bundle.write_bundle(&quote, &history, &prices)?;

    Ok(ExportSummary {
        ticker: ticker.clone(),
        statement_years: history.len(),
        series: series
            .into_iter()
            .map(|(symbol, bars)| (symbol, bars.len()))
            .collect(),
    })
}
