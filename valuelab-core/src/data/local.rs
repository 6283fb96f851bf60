//! Offline data bundle.
//!
//! Layout:
//! ```text
//! {root}/{TICKER}/quote.toml        quote fields
//! {root}/{TICKER}/statements.csv    one row per line item, one column per fiscal year end
//! {root}/prices/{SYMBOL}.csv        daily bars for stocks and benchmark indices
//! ```
//!
//! Empty statement cells mean the company does not report the item. Writes
//! go to a `.tmp` sibling first and are renamed into place.

use super::provider::{DataError, FinancialHistoryProvider, MarketDataProvider, Provider};
use crate::domain::{
    Country, DailyBar, FinancialStatementYear, LineItem, QuoteSnapshot, StatementHistory, Ticker,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const LINE_ITEM_COLUMN: &str = "line_item";

/// On-disk form of `QuoteSnapshot`.
#[derive(Debug, Serialize, Deserialize)]
struct QuoteFile {
    short_name: String,
    previous_close: f64,
    shares_outstanding: f64,
    currency: String,
    #[serde(default)]
    country: String,
    beta: Option<f64>,
}

pub struct LocalBundleProvider {
    root: PathBuf,
}

impl LocalBundleProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ticker_dir(&self, ticker: &Ticker) -> PathBuf {
        self.root.join(ticker.as_str())
    }

    fn prices_path(&self, symbol: &str) -> PathBuf {
        self.root.join("prices").join(format!("{symbol}.csv"))
    }

    fn existing_ticker_dir(&self, ticker: &Ticker) -> Result<PathBuf, DataError> {
        let dir = self.ticker_dir(ticker);
        if dir.is_dir() {
            Ok(dir)
        } else {
            Err(DataError::SymbolNotFound {
                symbol: ticker.to_string(),
            })
        }
    }

    /// Store a company's quote, statements and price series.
    pub fn write_bundle(
        &self,
        quote: &QuoteSnapshot,
        history: &StatementHistory,
        prices: &[(&str, &[DailyBar])],
    ) -> Result<(), DataError> {
        let dir = self.ticker_dir(&quote.ticker);
        fs::create_dir_all(&dir).map_err(|e| bundle_err("create dir", &dir, e))?;

        let file = QuoteFile {
            short_name: quote.short_name.clone(),
            previous_close: quote.previous_close,
            shares_outstanding: quote.shares_outstanding,
            currency: quote.currency.clone(),
            country: quote.country.name().to_string(),
            beta: quote.beta,
        };
        let toml = toml::to_string_pretty(&file)
            .map_err(|e| DataError::Bundle(format!("quote serialization: {e}")))?;
        write_atomic(&dir.join("quote.toml"), toml.as_bytes())?;

        write_atomic(&dir.join("statements.csv"), &statements_csv(history)?)?;

        for (symbol, bars) in prices {
            self.write_prices(symbol, bars)?;
        }

        tracing::info!(
            ticker = %quote.ticker,
            years = history.len(),
            series = prices.len(),
            root = %self.root.display(),
            "wrote data bundle"
        );
        Ok(())
    }

    pub fn write_prices(&self, symbol: &str, bars: &[DailyBar]) -> Result<(), DataError> {
        let path = self.prices_path(symbol);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| bundle_err("create dir", parent, e))?;
        }
        let mut writer = csv::Writer::from_writer(Vec::new());
        for bar in bars {
            writer
                .serialize(bar)
                .map_err(|e| DataError::Bundle(format!("price row: {e}")))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| DataError::Bundle(format!("price csv: {e}")))?;
        write_atomic(&path, &bytes)
    }
}

fn bundle_err(action: &str, path: &Path, e: impl std::fmt::Display) -> DataError {
    DataError::Bundle(format!("{action} {}: {e}", path.display()))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), DataError> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).map_err(|e| bundle_err("write", &tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        bundle_err("rename", path, e)
    })
}

fn statements_csv(history: &StatementHistory) -> Result<Vec<u8>, DataError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let csv_err = |e: csv::Error| DataError::Bundle(format!("statements csv: {e}"));

    let mut header = vec![LINE_ITEM_COLUMN.to_string()];
    for (i, year) in history.years().iter().enumerate() {
        let label = match year.period_end {
            Some(date) => date.to_string(),
            None => format!("year_{i}"),
        };
        header.push(label);
    }
    writer.write_record(&header).map_err(csv_err)?;

    for item in LineItem::ALL {
        let mut row = vec![item.key().to_string()];
        row.extend(
            history
                .years()
                .iter()
                .map(|y| y.get(item).map(|v| v.to_string()).unwrap_or_default()),
        );
        writer.write_record(&row).map_err(csv_err)?;
    }

    writer
        .into_inner()
        .map_err(|e| DataError::Bundle(format!("statements csv: {e}")))
}

fn parse_statements(path: &Path) -> Result<StatementHistory, DataError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| bundle_err("open", path, e))?;
    let headers = reader
        .headers()
        .map_err(|e| bundle_err("read header", path, e))?
        .clone();

    if headers.get(0) != Some(LINE_ITEM_COLUMN) {
        return Err(DataError::Bundle(format!(
            "{}: first column must be '{LINE_ITEM_COLUMN}'",
            path.display()
        )));
    }

    // Non-date column labels are kept as undated years.
    let mut years: Vec<FinancialStatementYear> = headers
        .iter()
        .skip(1)
        .map(|label| FinancialStatementYear::new(NaiveDate::parse_from_str(label, "%Y-%m-%d").ok()))
        .collect();

    for record in reader.records() {
        let record = record.map_err(|e| bundle_err("read row", path, e))?;
        let key = record.get(0).unwrap_or_default().trim();
        let Some(item) = LineItem::from_key(key) else {
            tracing::debug!(key, path = %path.display(), "skipping unknown line item");
            continue;
        };
        for (year, cell) in years.iter_mut().zip(record.iter().skip(1)) {
            let cell = cell.trim();
            if cell.is_empty() {
                continue;
            }
            let value: f64 = cell.parse().map_err(|e| {
                DataError::Bundle(format!("{}: {key} value '{cell}': {e}", path.display()))
            })?;
            year.set(item, Some(value));
        }
    }

    Ok(StatementHistory::from_unordered(years))
}

impl Provider for LocalBundleProvider {
    fn name(&self) -> &str {
        "local_bundle"
    }

    fn is_available(&self) -> bool {
        self.root.is_dir()
    }
}

impl FinancialHistoryProvider for LocalBundleProvider {
    fn fetch_quote(&self, ticker: &Ticker) -> Result<QuoteSnapshot, DataError> {
        let path = self.existing_ticker_dir(ticker)?.join("quote.toml");
        let content = fs::read_to_string(&path).map_err(|e| bundle_err("read", &path, e))?;
        let file: QuoteFile = toml::from_str(&content).map_err(|e| bundle_err("parse", &path, e))?;

        Ok(QuoteSnapshot {
            ticker: ticker.clone(),
            short_name: file.short_name,
            previous_close: file.previous_close,
            shares_outstanding: file.shares_outstanding,
            currency: file.currency,
            country: Country::from_name(&file.country),
            beta: file.beta,
        })
    }

    fn fetch_financials(&self, ticker: &Ticker) -> Result<StatementHistory, DataError> {
        let path = self.existing_ticker_dir(ticker)?.join("statements.csv");
        if !path.exists() {
            return Err(DataError::NoFundamentals {
                symbol: ticker.to_string(),
            });
        }
        let history = parse_statements(&path)?;
        if history.is_empty() {
            return Err(DataError::NoFundamentals {
                symbol: ticker.to_string(),
            });
        }
        Ok(history)
    }
}

impl MarketDataProvider for LocalBundleProvider {
    fn fetch_daily_prices(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, DataError> {
        let path = self.prices_path(symbol);
        if !path.exists() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        let mut reader = csv::Reader::from_path(&path).map_err(|e| bundle_err("open", &path, e))?;
        let mut bars = Vec::new();
        for row in reader.deserialize::<DailyBar>() {
            let bar = row.map_err(|e| bundle_err("read bar", &path, e))?;
            if bar.date >= start && bar.date <= end {
                bars.push(bar);
            }
        }

        if bars.is_empty() {
            return Err(DataError::EmptySeries {
                symbol: symbol.to_string(),
                start,
                end,
            });
        }
        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}
