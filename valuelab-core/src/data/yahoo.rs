//! Yahoo Finance provider.
//!
//! Three endpoints:
//! - v8 chart: daily OHLCV bars for stocks and indices.
//! - fundamentals-timeseries: annual statement line items.
//! - v10 quoteSummary: previous close, shares outstanding, currency, country
//!   and beta. Needs a session cookie plus a crumb token.
//!
//! Yahoo has no official API and changes formats without notice. Every
//! request goes through bounded retries with exponential backoff and the
//! shared circuit breaker. The offline bundle is the fallback when Yahoo is
//! unavailable.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, FinancialHistoryProvider, MarketDataProvider, Provider};
use crate::domain::{
    Country, DailyBar, FinancialStatementYear, LineItem, QuoteSnapshot, StatementHistory, Ticker,
};
use chrono::{Months, NaiveDate, NaiveTime, Utc};
use reqwest::blocking::Response;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const CHART_BASE: &str = "https://query2.finance.yahoo.com/v8/finance/chart/";
const SUMMARY_BASE: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary/";
const TIMESERIES_BASE: &str =
    "https://query2.finance.yahoo.com/ws/fundamentals-timeseries/v1/finance/timeseries/";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URL: &str = "https://query2.finance.yahoo.com/v1/test/getcrumb";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const SUMMARY_MODULES: &str = "price,summaryDetail,defaultKeyStatistics,assetProfile";

/// Annual filings requested; Yahoo typically returns four or five.
const STATEMENT_LOOKBACK_MONTHS: u32 = 12 * 6;

/// Timeseries keys for each line item, in order of preference.
const TIMESERIES_KEYS: [(LineItem, &[&str]); 13] = [
    (LineItem::Ebit, &["annualEBIT"]),
    (LineItem::TaxExpense, &["annualTaxProvision"]),
    (
        LineItem::DepreciationAmortization,
        &[
            "annualDepreciationAndAmortization",
            "annualDepreciationAmortizationDepletion",
            "annualReconciledDepreciation",
        ],
    ),
    (LineItem::CapitalExpenditure, &["annualCapitalExpenditure"]),
    (LineItem::InterestExpense, &["annualInterestExpense"]),
    (
        LineItem::NetReceivables,
        &["annualAccountsReceivable", "annualReceivables"],
    ),
    (LineItem::Inventory, &["annualInventory"]),
    (
        LineItem::AccountsPayable,
        &["annualAccountsPayable", "annualPayables"],
    ),
    (
        LineItem::Cash,
        &[
            "annualCashAndCashEquivalents",
            "annualCashCashEquivalentsAndShortTermInvestments",
        ],
    ),
    (LineItem::LongTermDebt, &["annualLongTermDebt"]),
    (LineItem::TotalStockholderEquity, &["annualStockholdersEquity"]),
    (
        LineItem::TotalLiabilities,
        &["annualTotalLiabilitiesNetMinorityInterest"],
    ),
    (LineItem::TotalAssets, &["annualTotalAssets"]),
];

// ─── Wire formats ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    description: String,
}

/// `{"raw": 1.23, "fmt": "1.23"}`, or `{}` when Yahoo has no value.
#[derive(Debug, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

fn raw(v: &Option<RawValue>) -> Option<f64> {
    v.as_ref().and_then(|r| r.raw).filter(|x| x.is_finite())
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: SummaryResult,
}

#[derive(Debug, Deserialize)]
struct SummaryResult {
    result: Option<Vec<SummaryData>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryData {
    price: Option<PriceModule>,
    summary_detail: Option<SummaryDetailModule>,
    default_key_statistics: Option<KeyStatisticsModule>,
    asset_profile: Option<AssetProfileModule>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    short_name: Option<String>,
    long_name: Option<String>,
    currency: Option<String>,
    regular_market_previous_close: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetailModule {
    previous_close: Option<RawValue>,
    beta: Option<RawValue>,
    currency: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyStatisticsModule {
    shares_outstanding: Option<RawValue>,
    beta: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct AssetProfileModule {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesResponse {
    timeseries: TimeseriesResult,
}

#[derive(Debug, Deserialize)]
struct TimeseriesResult {
    result: Option<Vec<TimeseriesEntry>>,
    error: Option<ApiError>,
}

/// One requested type. The values sit under a key named after the type.
#[derive(Debug, Deserialize)]
struct TimeseriesEntry {
    meta: TimeseriesMeta,
    #[serde(flatten)]
    series: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesMeta {
    #[serde(rename = "type", default)]
    kind: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimeseriesPoint {
    as_of_date: NaiveDate,
    reported_value: Option<RawValue>,
}

// ─── Provider ────────────────────────────────────────────────────────

/// Transport settings for the Yahoo client.
#[derive(Debug, Clone)]
pub struct YahooOptions {
    pub timeout: Duration,
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for YahooOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    crumb: Mutex<Option<String>>,
    options: YahooOptions,
}

impl YahooProvider {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>, options: YahooOptions) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(options.timeout)
            .connect_timeout(options.timeout.min(Duration::from_secs(10)))
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            crumb: Mutex::new(None),
            options,
        })
    }

    fn endpoint(base: &str, symbol: &str) -> Result<Url, DataError> {
        let mut url =
            Url::parse(base).map_err(|e| DataError::Other(format!("invalid endpoint {base}: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| DataError::Other(format!("endpoint {base} cannot take a path")))?
            .pop_if_empty()
            .push(symbol);
        Ok(url)
    }

    fn start_ts(date: NaiveDate) -> i64 {
        date.and_time(NaiveTime::MIN).and_utc().timestamp()
    }

    fn end_ts(date: NaiveDate) -> i64 {
        Self::start_ts(date) + 86_399
    }

    fn chart_url(symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Url, DataError> {
        let mut url = Self::endpoint(CHART_BASE, symbol)?;
        url.query_pairs_mut()
            .append_pair("period1", &Self::start_ts(start).to_string())
            .append_pair("period2", &Self::end_ts(end).to_string())
            .append_pair("interval", "1d")
            .append_pair("includeAdjustedClose", "true");
        Ok(url)
    }

    fn timeseries_url(symbol: &str, today: NaiveDate) -> Result<Url, DataError> {
        let types: Vec<&str> = TIMESERIES_KEYS
            .iter()
            .flat_map(|(_, keys)| keys.iter().copied())
            .collect();
        let from = today
            .checked_sub_months(Months::new(STATEMENT_LOOKBACK_MONTHS))
            .unwrap_or(today);
        let mut url = Self::endpoint(TIMESERIES_BASE, symbol)?;
        url.query_pairs_mut()
            .append_pair("symbol", symbol)
            .append_pair("type", &types.join(","))
            .append_pair("period1", &Self::start_ts(from).to_string())
            .append_pair("period2", &Self::end_ts(today).to_string());
        Ok(url)
    }

    fn summary_url(symbol: &str, crumb: &str) -> Result<Url, DataError> {
        let mut url = Self::endpoint(SUMMARY_BASE, symbol)?;
        url.query_pairs_mut()
            .append_pair("modules", SUMMARY_MODULES)
            .append_pair("crumb", crumb);
        Ok(url)
    }

    fn api_error(symbol: &str, error: Option<ApiError>) -> DataError {
        match error {
            Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            },
            Some(err) => DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description)),
            None => DataError::ResponseFormatChanged("empty result with no error".into()),
        }
    }

    /// Parse chart bars. Days where every field is null are dropped.
    fn parse_chart(symbol: &str, resp: ChartResponse) -> Result<Vec<DailyBar>, DataError> {
        let result = match resp.chart.result {
            Some(r) => r,
            None => return Err(Self::api_error(symbol, resp.chart.error)),
        };

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        // Yahoo omits timestamps entirely for an empty range.
        let Some(timestamps) = data.timestamp else {
            return Ok(Vec::new());
        };
        let offset = data.meta.and_then(|m| m.gmtoffset).unwrap_or(0);

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let adj_closes = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts + offset, 0)
                .map(|dt| dt.date_naive())
                .ok_or_else(|| DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}")))?;

            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();
            let adj_close = adj_closes.as_ref().and_then(|v| v.get(i).copied().flatten());

            if open.is_none() && high.is_none() && low.is_none() && close.is_none() && volume.is_none() {
                continue;
            }

            bars.push(DailyBar {
                date,
                open: open.unwrap_or(f64::NAN),
                high: high.unwrap_or(f64::NAN),
                low: low.unwrap_or(f64::NAN),
                close: close.unwrap_or(f64::NAN),
                adj_close: adj_close.unwrap_or(f64::NAN),
                volume: volume.unwrap_or(0),
            });
        }

        Ok(bars)
    }

    fn parse_summary(ticker: &Ticker, resp: SummaryResponse) -> Result<QuoteSnapshot, DataError> {
        let symbol = ticker.as_str();
        let result = match resp.quote_summary.result {
            Some(r) => r,
            None => return Err(Self::api_error(symbol, resp.quote_summary.error)),
        };
        let data = result.into_iter().next().ok_or_else(|| DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        })?;

        let price = data.price;
        let detail = data.summary_detail;
        let stats = data.default_key_statistics;

        let previous_close = detail
            .as_ref()
            .and_then(|d| raw(&d.previous_close))
            .or_else(|| price.as_ref().and_then(|p| raw(&p.regular_market_previous_close)))
            .ok_or_else(|| {
                DataError::ResponseFormatChanged(format!("quote for {symbol} has no previous close"))
            })?;

        let shares_outstanding = stats
            .as_ref()
            .and_then(|s| raw(&s.shares_outstanding))
            .ok_or_else(|| {
                DataError::ResponseFormatChanged(format!(
                    "quote for {symbol} has no shares outstanding"
                ))
            })?;

        let beta = detail
            .as_ref()
            .and_then(|d| raw(&d.beta))
            .or_else(|| stats.as_ref().and_then(|s| raw(&s.beta)));

        let currency = price
            .as_ref()
            .and_then(|p| p.currency.clone())
            .or_else(|| detail.as_ref().and_then(|d| d.currency.clone()))
            .unwrap_or_default();

        let short_name = price
            .as_ref()
            .and_then(|p| p.short_name.clone().or_else(|| p.long_name.clone()))
            .unwrap_or_else(|| symbol.to_string());

        let country = data
            .asset_profile
            .and_then(|a| a.country)
            .map(|c| Country::from_name(&c))
            .unwrap_or_else(|| Country::Other(String::new()));

        Ok(QuoteSnapshot {
            ticker: ticker.clone(),
            short_name,
            previous_close,
            shares_outstanding,
            currency,
            country,
            beta,
        })
    }

    /// Group the requested timeseries by fiscal year end.
    ///
    /// Capital expenditure and interest expense are stored as positive
    /// magnitudes whatever sign Yahoo reports them with.
    fn parse_timeseries(symbol: &str, resp: TimeseriesResponse) -> Result<StatementHistory, DataError> {
        let entries = match resp.timeseries.result {
            Some(r) => r,
            None => return Err(Self::api_error(symbol, resp.timeseries.error)),
        };

        let mut by_key: HashMap<String, BTreeMap<NaiveDate, f64>> = HashMap::new();
        for mut entry in entries {
            let Some(kind) = entry.meta.kind.first().cloned() else {
                continue;
            };
            let Some(values) = entry.series.remove(&kind) else {
                continue;
            };
            let points: Vec<Option<TimeseriesPoint>> = serde_json::from_value(values)
                .map_err(|e| DataError::ResponseFormatChanged(format!("timeseries {kind}: {e}")))?;
            let series = by_key.entry(kind).or_default();
            for point in points.into_iter().flatten() {
                if let Some(v) = raw(&point.reported_value) {
                    series.insert(point.as_of_date, v);
                }
            }
        }

        let dates: BTreeSet<NaiveDate> = by_key.values().flat_map(|s| s.keys().copied()).collect();
        if dates.is_empty() {
            return Err(DataError::NoFundamentals {
                symbol: symbol.to_string(),
            });
        }

        let years = dates
            .into_iter()
            .map(|date| {
                let mut year = FinancialStatementYear::new(Some(date));
                for (item, keys) in TIMESERIES_KEYS {
                    let value = keys
                        .iter()
                        .find_map(|k| by_key.get(*k).and_then(|s| s.get(&date)).copied());
                    let value = match item {
                        LineItem::CapitalExpenditure | LineItem::InterestExpense => value.map(f64::abs),
                        _ => value,
                    };
                    year.set(item, value);
                }
                year
            })
            .collect();

        Ok(StatementHistory::from_unordered(years))
    }

    /// Send a GET with retry and circuit breaker handling. Returns only
    /// successful responses.
    fn get(&self, url: &Url, symbol: &str) -> Result<Response, DataError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }

        let mut last_error = None;

        for attempt in 0..=self.options.max_retries {
            if attempt > 0 {
                let delay = self.options.base_delay * 2u32.pow(attempt - 1);
                tracing::debug!(symbol, attempt, ?delay, "retrying Yahoo request");
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            tracing::debug!(symbol, path = url.path(), "GET");
            match self.client.get(url.clone()).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == StatusCode::FORBIDDEN {
                        self.circuit_breaker.trip();
                        return Err(DataError::CircuitBreakerTripped);
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        self.circuit_breaker.record_failure();
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        last_error = Some(DataError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        continue;
                    }

                    if status == StatusCode::UNAUTHORIZED {
                        return Err(DataError::AuthenticationRequired(
                            "Yahoo Finance rejected the session crumb".into(),
                        ));
                    }

                    if status == StatusCode::NOT_FOUND {
                        return Err(DataError::SymbolNotFound {
                            symbol: symbol.to_string(),
                        });
                    }

                    if !status.is_success() {
                        self.circuit_breaker.record_failure();
                        last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                        continue;
                    }

                    self.circuit_breaker.record_success();
                    return Ok(resp);
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }

    fn get_json<T: DeserializeOwned>(&self, url: &Url, symbol: &str) -> Result<T, DataError> {
        self.get(url, symbol)?.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
        })
    }

    fn crumb(&self) -> Result<String, DataError> {
        if let Some(crumb) = self.crumb.lock().unwrap_or_else(|p| p.into_inner()).clone() {
            return Ok(crumb);
        }

        // Only the Set-Cookie header matters; fc.yahoo.com answers 404.
        if let Err(e) = self.client.get(COOKIE_URL).send() {
            tracing::debug!(error = %e, "Yahoo session cookie request failed");
        }

        let url = Url::parse(CRUMB_URL).map_err(|e| DataError::Other(e.to_string()))?;
        let body = self
            .get(&url, "crumb")?
            .text()
            .map_err(|e| DataError::ResponseFormatChanged(format!("crumb body: {e}")))?;
        let crumb = body.trim();
        if crumb.is_empty() || crumb.len() > 64 || crumb.contains(['<', ' ']) {
            return Err(DataError::AuthenticationRequired(
                "Yahoo returned no usable crumb".into(),
            ));
        }

        *self.crumb.lock().unwrap_or_else(|p| p.into_inner()) = Some(crumb.to_string());
        Ok(crumb.to_string())
    }

    fn clear_crumb(&self) {
        *self.crumb.lock().unwrap_or_else(|p| p.into_inner()) = None;
    }
}

impl Provider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

impl FinancialHistoryProvider for YahooProvider {
    fn fetch_quote(&self, ticker: &Ticker) -> Result<QuoteSnapshot, DataError> {
        let symbol = ticker.as_str();
        let fetch = |crumb: &str| -> Result<SummaryResponse, DataError> {
            self.get_json(&Self::summary_url(symbol, crumb)?, symbol)
        };

        let resp = match fetch(&self.crumb()?) {
            Err(DataError::AuthenticationRequired(_)) => {
                tracing::debug!(symbol, "crumb rejected, refreshing session");
                self.clear_crumb();
                fetch(&self.crumb()?)?
            }
            other => other?,
        };
        Self::parse_summary(ticker, resp)
    }

    fn fetch_financials(&self, ticker: &Ticker) -> Result<StatementHistory, DataError> {
        let symbol = ticker.as_str();
        let url = Self::timeseries_url(symbol, Utc::now().date_naive())?;
        let resp: TimeseriesResponse = self.get_json(&url, symbol)?;
        let history = Self::parse_timeseries(symbol, resp)?;
        tracing::debug!(symbol, years = history.len(), "fetched annual statements");
        Ok(history)
    }
}

impl MarketDataProvider for YahooProvider {
    fn fetch_daily_prices(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, DataError> {
        let url = Self::chart_url(symbol, start, end)?;
        let resp: ChartResponse = self.get_json(&url, symbol)?;
        let bars: Vec<DailyBar> = Self::parse_chart(symbol, resp)?
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect();
        if bars.is_empty() {
            return Err(DataError::EmptySeries {
                symbol: symbol.to_string(),
                start,
                end,
            });
        }
        Ok(bars)
    }
}
