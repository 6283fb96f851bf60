//! Historical financial-statement line items.
//!
//! Providers report whatever a filing contains, so every line item is optional
//! here. The valuation stages decide which items they require and turn an
//! absent item into a domain mismatch (banks, for instance, report neither
//! inventory nor capital expenditure).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single line item across the income statement, cash-flow statement and
/// balance sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineItem {
    Ebit,
    TaxExpense,
    DepreciationAmortization,
    CapitalExpenditure,
    InterestExpense,
    NetReceivables,
    Inventory,
    AccountsPayable,
    Cash,
    LongTermDebt,
    TotalStockholderEquity,
    TotalLiabilities,
    TotalAssets,
}

impl LineItem {
    pub const ALL: [LineItem; 13] = [
        LineItem::Ebit,
        LineItem::TaxExpense,
        LineItem::DepreciationAmortization,
        LineItem::CapitalExpenditure,
        LineItem::InterestExpense,
        LineItem::NetReceivables,
        LineItem::Inventory,
        LineItem::AccountsPayable,
        LineItem::Cash,
        LineItem::LongTermDebt,
        LineItem::TotalStockholderEquity,
        LineItem::TotalLiabilities,
        LineItem::TotalAssets,
    ];

    /// Machine key used in bundle files (`statements.csv`).
    pub fn key(self) -> &'static str {
        match self {
            LineItem::Ebit => "ebit",
            LineItem::TaxExpense => "tax_expense",
            LineItem::DepreciationAmortization => "depreciation_amortization",
            LineItem::CapitalExpenditure => "capital_expenditure",
            LineItem::InterestExpense => "interest_expense",
            LineItem::NetReceivables => "net_receivables",
            LineItem::Inventory => "inventory",
            LineItem::AccountsPayable => "accounts_payable",
            LineItem::Cash => "cash",
            LineItem::LongTermDebt => "long_term_debt",
            LineItem::TotalStockholderEquity => "total_stockholder_equity",
            LineItem::TotalLiabilities => "total_liabilities",
            LineItem::TotalAssets => "total_assets",
        }
    }

    /// Look up a line item by its bundle key.
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::ALL.into_iter().find(|item| item.key() == key)
    }

    /// Label as it appears on published statements.
    pub fn label(self) -> &'static str {
        match self {
            LineItem::Ebit => "EBIT",
            LineItem::TaxExpense => "Income Tax Expense",
            LineItem::DepreciationAmortization => "Depreciation & Amortization",
            LineItem::CapitalExpenditure => "Capital Expenditures",
            LineItem::InterestExpense => "Interest Expense",
            LineItem::NetReceivables => "Net Receivables",
            LineItem::Inventory => "Inventory",
            LineItem::AccountsPayable => "Accounts Payable",
            LineItem::Cash => "Cash",
            LineItem::LongTermDebt => "Long Term Debt",
            LineItem::TotalStockholderEquity => "Total Stockholder Equity",
            LineItem::TotalLiabilities => "Total Liabilities",
            LineItem::TotalAssets => "Total Assets",
        }
    }
}

impl fmt::Display for LineItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One fiscal year of reported line items.
///
/// Capital expenditure is stored as a positive outflow; providers normalise
/// the sign convention of their source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialStatementYear {
    #[serde(default)]
    pub period_end: Option<NaiveDate>,
    pub ebit: Option<f64>,
    pub tax_expense: Option<f64>,
    pub depreciation_amortization: Option<f64>,
    pub capital_expenditure: Option<f64>,
    pub interest_expense: Option<f64>,
    pub net_receivables: Option<f64>,
    pub inventory: Option<f64>,
    pub accounts_payable: Option<f64>,
    pub cash: Option<f64>,
    pub long_term_debt: Option<f64>,
    pub total_stockholder_equity: Option<f64>,
    pub total_liabilities: Option<f64>,
    pub total_assets: Option<f64>,
}

impl FinancialStatementYear {
    pub fn new(period_end: Option<NaiveDate>) -> Self {
        Self {
            period_end,
            ..Self::default()
        }
    }

    pub fn get(&self, item: LineItem) -> Option<f64> {
        *self.slot(item)
    }

    pub fn set(&mut self, item: LineItem, value: Option<f64>) {
        *self.slot_mut(item) = value;
    }

    /// Builder-style setter, convenient for fixtures.
    pub fn with(mut self, item: LineItem, value: f64) -> Self {
        self.set(item, Some(value));
        self
    }

    /// Line items this year does not report.
    pub fn missing(&self) -> Vec<LineItem> {
        LineItem::ALL
            .into_iter()
            .filter(|item| self.get(*item).is_none())
            .collect()
    }

    fn slot(&self, item: LineItem) -> &Option<f64> {
        match item {
            LineItem::Ebit => &self.ebit,
            LineItem::TaxExpense => &self.tax_expense,
            LineItem::DepreciationAmortization => &self.depreciation_amortization,
            LineItem::CapitalExpenditure => &self.capital_expenditure,
            LineItem::InterestExpense => &self.interest_expense,
            LineItem::NetReceivables => &self.net_receivables,
            LineItem::Inventory => &self.inventory,
            LineItem::AccountsPayable => &self.accounts_payable,
            LineItem::Cash => &self.cash,
            LineItem::LongTermDebt => &self.long_term_debt,
            LineItem::TotalStockholderEquity => &self.total_stockholder_equity,
            LineItem::TotalLiabilities => &self.total_liabilities,
            LineItem::TotalAssets => &self.total_assets,
        }
    }

    fn slot_mut(&mut self, item: LineItem) -> &mut Option<f64> {
        match item {
            LineItem::Ebit => &mut self.ebit,
            LineItem::TaxExpense => &mut self.tax_expense,
            LineItem::DepreciationAmortization => &mut self.depreciation_amortization,
            LineItem::CapitalExpenditure => &mut self.capital_expenditure,
            LineItem::InterestExpense => &mut self.interest_expense,
            LineItem::NetReceivables => &mut self.net_receivables,
            LineItem::Inventory => &mut self.inventory,
            LineItem::AccountsPayable => &mut self.accounts_payable,
            LineItem::Cash => &mut self.cash,
            LineItem::LongTermDebt => &mut self.long_term_debt,
            LineItem::TotalStockholderEquity => &mut self.total_stockholder_equity,
            LineItem::TotalLiabilities => &mut self.total_liabilities,
            LineItem::TotalAssets => &mut self.total_assets,
        }
    }
}

/// Fiscal years ordered most-recent-first. Index 0 is the latest filing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementHistory {
    years: Vec<FinancialStatementYear>,
}

impl StatementHistory {
    /// Build a history from years that are already ordered most-recent-first.
    pub fn new(years: Vec<FinancialStatementYear>) -> Self {
        Self { years }
    }

    /// Build a history from years in any order, sorting by `period_end`
    /// descending. Years without a period end keep their relative position
    /// after the dated ones.
    pub fn from_unordered(mut years: Vec<FinancialStatementYear>) -> Self {
        years.sort_by(|a, b| match (a.period_end, b.period_end) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        Self { years }
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn year(&self, index: usize) -> Option<&FinancialStatementYear> {
        self.years.get(index)
    }

    pub fn years(&self) -> &[FinancialStatementYear] {
        &self.years
    }

    /// Value of `item` in fiscal year `index`, if both exist.
    pub fn get(&self, index: usize, item: LineItem) -> Option<f64> {
        self.years.get(index).and_then(|y| y.get(item))
    }
}
