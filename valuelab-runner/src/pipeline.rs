//! End-to-end valuation of one ticker.
//!
//! Stages run strictly in order, each consuming the immutable output of the
//! previous one:
//! quote → statements → suitability → free cash flow → growth → prices and
//! returns → cost of capital → projection → equity bridge → recommendation.
//! The first failure aborts the run; there is no partial report.

use crate::config::{ConfigError, FallbackReturnSeries, ValuationConfig};
use crate::report::ValuationReport;
use chrono::{Days, Months, NaiveDate};
use thiserror::Error;
use valuelab_core::data::{DataError, FinancialHistoryProvider, MarketDataProvider};
use valuelab_core::domain::{
    adjusted_closes, DailyBar, QuoteSnapshot, StatementHistory, Ticker, TickerError,
};
use valuelab_core::fingerprint::InputFingerprint;
use valuelab_core::stats::summarize_prices;
use valuelab_core::valuation::{
    aggregate, assess, check_suitability, compute_cost_of_capital, estimate_free_cash_flows,
    mean_annual_return, project, select_growth_rate, CostOfEquity, Suitability, ValuationError,
};
use valuelab_core::valuation::fcf::REQUIRED_STATEMENT_YEARS;
use valuelab_core::ErrorKind;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid ticker: {0}")]
    Ticker(#[from] TickerError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Valuation(#[from] ValuationError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Ticker(_) => ErrorKind::InputValidation,
            PipelineError::Data(e) => e.kind(),
            PipelineError::Valuation(e) => e.kind(),
            PipelineError::Config(e) => e.kind(),
        }
    }
}

/// Fetch the statements and screen out companies a DCF cannot value.
/// Histories too short to value are rejected before the screen.
pub fn check_ticker(
    ticker: &Ticker,
    financials: &dyn FinancialHistoryProvider,
) -> Result<Suitability, PipelineError> {
    let history = financials.fetch_financials(ticker)?;
    require_history(&history)?;
    Ok(check_suitability(&history))
}

/// Value `ticker` as of `today`.
pub fn run_valuation(
    ticker: &Ticker,
    financials: &dyn FinancialHistoryProvider,
    market: &dyn MarketDataProvider,
    config: &ValuationConfig,
    today: NaiveDate,
) -> Result<ValuationReport, PipelineError> {
    config.validate()?;
    let span = tracing::info_span!("valuation", ticker = %ticker);
    let _enter = span.enter();

    // ── Quote & statements ──
    let quote = financials.fetch_quote(ticker)?;
    if !quote.previous_close.is_finite() || quote.previous_close <= 0.0 {
        return Err(ValuationError::InvalidQuote {
            field: "previous close",
            value: quote.previous_close,
        }
        .into());
    }
    tracing::debug!(
        name = %quote.short_name,
        price = quote.previous_close,
        country = %quote.country,
        "fetched quote"
    );

    let history = financials.fetch_financials(ticker)?;
    require_history(&history)?;
    check_suitability(&history).into_result()?;

    // ── Free cash flow & growth ──
    let free_cash_flows = estimate_free_cash_flows(&history)?;
    let growth = select_growth_rate(&free_cash_flows.series)?;
    tracing::debug!(
        fcf = ?free_cash_flows.series.values(),
        growth = growth.rate,
        branch = ?growth.branch,
        "estimated free cash flows"
    );

    // ── Prices & returns ──
    let benchmark = config
        .benchmark_override
        .clone()
        .unwrap_or_else(|| quote.benchmark_symbol().to_string());

    let (returns_start, summary_start) = price_windows(config, today);

    let stock_bars = market.fetch_daily_prices(
        ticker.as_str(),
        returns_start.min(summary_start),
        today,
    )?;
    let stock_prices = window_prices(&stock_bars, returns_start);

    let mut fingerprint = InputFingerprint::new()
        .quote(&quote)
        .statements(&history)
        .prices(ticker.as_str(), &stock_prices);

    let benchmark_prices = if needs_benchmark(&quote, config) {
        let bars = market
            .fetch_daily_prices(&benchmark, returns_start, today)
            .map_err(benchmark_unavailable)?;
        let prices = window_prices(&bars, returns_start);
        fingerprint = fingerprint.prices(&benchmark, &prices);
        prices
    } else {
        Vec::new()
    };

    let mut warnings = Vec::new();
    let cost_of_equity = match quote.beta {
        Some(beta) => {
            let market_return = mean_annual_return(&benchmark, &benchmark_prices)?;
            CostOfEquity::capm(config.risk_free_rate, beta, market_return)
        }
        None => {
            let (symbol, prices) = match config.fallback_return_series {
                FallbackReturnSeries::Stock => (ticker.as_str(), &stock_prices),
                FallbackReturnSeries::Benchmark => (benchmark.as_str(), &benchmark_prices),
            };
            warnings.push(format!(
                "no beta published; cost of equity is the mean annual return of {symbol}"
            ));
            CostOfEquity::historical(symbol, mean_annual_return(symbol, prices)?)
        }
    };

    // ── Cost of capital ──
    let cost_of_capital = compute_cost_of_capital(&history, config.risk_free_rate, cost_of_equity)?;
    warnings.extend(cost_of_capital.capital_structure.warnings());
    tracing::debug!(
        cost_of_equity = cost_of_capital.cost_of_equity.rate(),
        cost_of_debt = cost_of_capital.cost_of_debt.rate,
        wacc = cost_of_capital.wacc,
        "computed cost of capital"
    );

    // ── Projection & equity bridge ──
    let projection = project(
        free_cash_flows.series.latest(),
        growth.rate,
        cost_of_capital.wacc,
        config.perpetual_rate,
        config.terminal_discounting,
    )?;
    let equity = aggregate(&projection, &history, quote.shares_outstanding)?;
    if equity.floored {
        warnings.push(format!(
            "enterprise value plus cash does not cover long-term debt; equity floored at {}",
            equity.equity_value
        ));
    }

    let (recommendation, conclusion) = assess(equity.fair_value_per_share, quote.previous_close);
    let price_summary = summarize_prices(&stock_bars, summary_start, today);

    for w in &warnings {
        tracing::warn!("{w}");
    }
    tracing::info!(
        fair_value = equity.fair_value_per_share,
        price = quote.previous_close,
        %recommendation,
        "valuation complete"
    );

    Ok(ValuationReport {
        ticker: ticker.clone(),
        company_name: quote.short_name.clone(),
        currency: quote.currency.clone(),
        country: quote.country.clone(),
        benchmark,
        valuation_date: today,
        current_price: quote.previous_close,
        free_cash_flows,
        growth,
        cost_of_capital,
        terminal_discounting: config.terminal_discounting,
        projection,
        fair_value_per_share: equity.fair_value_per_share,
        equity,
        recommendation,
        conclusion,
        price_summary,
        input_fingerprint: fingerprint.finish(),
        warnings,
    })
}

fn require_history(history: &StatementHistory) -> Result<(), ValuationError> {
    if history.len() < REQUIRED_STATEMENT_YEARS {
        return Err(ValuationError::InsufficientHistory {
            available: history.len(),
            required: REQUIRED_STATEMENT_YEARS,
        });
    }
    Ok(())
}

/// Benchmark prices feed CAPM, or the no-beta fallback when configured.
pub(crate) fn needs_benchmark(quote: &QuoteSnapshot, config: &ValuationConfig) -> bool {
    quote.beta.is_some() || config.fallback_return_series == FallbackReturnSeries::Benchmark
}

/// An unknown benchmark is a data problem, not a bad ticker.
pub(crate) fn benchmark_unavailable(e: DataError) -> DataError {
    match e {
        DataError::SymbolNotFound { symbol } => {
            DataError::Other(format!("benchmark series {symbol} is unavailable"))
        }
        other => other,
    }
}

/// Start dates of the return lookback and the trading summary window.
pub(crate) fn price_windows(config: &ValuationConfig, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let returns_start = today
        .checked_sub_months(Months::new(12 * config.return_lookback_years))
        .unwrap_or(NaiveDate::MIN);
    let summary_start = today
        .checked_sub_days(Days::new(u64::from(config.summary_window_days)))
        .unwrap_or(NaiveDate::MIN);
    (returns_start, summary_start)
}

fn window_prices(bars: &[DailyBar], start: NaiveDate) -> Vec<(NaiveDate, f64)> {
    adjusted_closes(bars)
        .into_iter()
        .filter(|(date, _)| *date >= start)
        .collect()
}
