//! In-memory providers and a deterministic four-year fixture.

#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;
use valuelab_core::data::{DataError, FinancialHistoryProvider, MarketDataProvider, Provider};
use valuelab_core::domain::{
    Country, DailyBar, FinancialStatementYear, LineItem, QuoteSnapshot, StatementHistory, Ticker,
};

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

pub fn today() -> NaiveDate {
    d(2024, 6, 28)
}

pub struct FakeFinancials {
    companies: HashMap<Ticker, (QuoteSnapshot, StatementHistory)>,
}

impl FakeFinancials {
    pub fn new() -> Self {
        Self {
            companies: HashMap::new(),
        }
    }

    pub fn with(mut self, quote: QuoteSnapshot, history: StatementHistory) -> Self {
        self.companies.insert(quote.ticker.clone(), (quote, history));
        self
    }
}

impl Provider for FakeFinancials {
    fn name(&self) -> &str {
        "fake_financials"
    }
}

impl FinancialHistoryProvider for FakeFinancials {
    fn fetch_quote(&self, ticker: &Ticker) -> Result<QuoteSnapshot, DataError> {
        self.companies
            .get(ticker)
            .map(|(q, _)| q.clone())
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: ticker.to_string(),
            })
    }

    fn fetch_financials(&self, ticker: &Ticker) -> Result<StatementHistory, DataError> {
        self.companies
            .get(ticker)
            .map(|(_, h)| h.clone())
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: ticker.to_string(),
            })
    }
}

/// Serves fixed series and records every symbol requested.
pub struct FakeMarket {
    series: HashMap<String, Vec<DailyBar>>,
    pub requests: Mutex<Vec<String>>,
}

impl FakeMarket {
    pub fn new() -> Self {
        Self {
            series: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with(mut self, symbol: &str, bars: Vec<DailyBar>) -> Self {
        self.series.insert(symbol.to_string(), bars);
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Provider for FakeMarket {
    fn name(&self) -> &str {
        "fake_market"
    }
}

impl MarketDataProvider for FakeMarket {
    fn fetch_daily_prices(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, DataError> {
        self.requests.lock().unwrap().push(symbol.to_string());
        let bars = self.series.get(symbol).ok_or_else(|| DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        })?;
        let window: Vec<DailyBar> = bars
            .iter()
            .filter(|b| b.date >= start && b.date <= end)
            .cloned()
            .collect();
        if window.is_empty() {
            return Err(DataError::EmptySeries {
                symbol: symbol.to_string(),
                start,
                end,
            });
        }
        Ok(window)
    }
}

#[allow(clippy::too_many_arguments)]
fn year(
    end: NaiveDate,
    ebit: f64,
    tax: f64,
    da: f64,
    capex: f64,
    receivables: f64,
    inventory: f64,
    payables: f64,
) -> FinancialStatementYear {
    FinancialStatementYear::new(Some(end))
        .with(LineItem::Ebit, ebit)
        .with(LineItem::TaxExpense, tax)
        .with(LineItem::DepreciationAmortization, da)
        .with(LineItem::CapitalExpenditure, capex)
        .with(LineItem::InterestExpense, 60.0)
        .with(LineItem::NetReceivables, receivables)
        .with(LineItem::Inventory, inventory)
        .with(LineItem::AccountsPayable, payables)
        .with(LineItem::Cash, 500.0)
        .with(LineItem::LongTermDebt, 800.0)
        .with(LineItem::TotalStockholderEquity, 3_000.0)
        .with(LineItem::TotalLiabilities, 2_000.0)
        .with(LineItem::TotalAssets, 5_000.0)
}

/// Free cash flows come out as 889, 812 and 752.5.
pub fn acme_history() -> StatementHistory {
    StatementHistory::new(vec![
        year(d(2023, 12, 31), 1200.0, 240.0, 180.0, 216.0, 480.0, 300.0, 360.0),
        year(d(2022, 12, 31), 1100.0, 220.0, 165.0, 198.0, 440.0, 275.0, 330.0),
        year(d(2021, 12, 31), 1000.0, 200.0, 150.0, 180.0, 400.0, 250.0, 300.0),
        year(d(2020, 12, 31), 950.0, 190.0, 142.5, 171.0, 380.0, 237.5, 285.0),
    ])
}

/// A bank: no inventory and no capital expenditure.
pub fn bank_history() -> StatementHistory {
    let strip = |y: &FinancialStatementYear| {
        let mut y = y.clone();
        y.set(LineItem::Inventory, None);
        y.set(LineItem::CapitalExpenditure, None);
        y
    };
    StatementHistory::new(acme_history().years().iter().map(strip).collect())
}

pub fn acme_quote(beta: Option<f64>) -> QuoteSnapshot {
    QuoteSnapshot {
        ticker: Ticker::parse("ACME").unwrap(),
        short_name: "Acme Corp".into(),
        previous_close: 30.0,
        shares_outstanding: 1_000.0,
        currency: "USD".into(),
        country: Country::UnitedStates,
        beta,
    }
}

/// Weekly bars from 2019-01-02 to `today()`, compounding at `annual`.
pub fn weekly_bars(start_price: f64, annual: f64) -> Vec<DailyBar> {
    let mut bars = Vec::new();
    let mut date = d(2019, 1, 2);
    let mut week = 0;
    while date <= today() {
        let close = start_price * (1.0 + annual).powf(week as f64 / 52.0);
        bars.push(DailyBar {
            date,
            open: close * 0.99,
            high: close * 1.01,
            low: close * 0.98,
            close,
            adj_close: close,
            volume: 10_000 + week * 10,
        });
        date += chrono::Duration::days(7);
        week += 1;
    }
    bars
}

pub fn acme_market() -> FakeMarket {
    FakeMarket::new()
        .with("ACME", weekly_bars(20.0, 0.10))
        .with("^GSPC", weekly_bars(3000.0, 0.08))
}
