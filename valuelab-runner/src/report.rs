//! Valuation report: everything one run produced, serializable to JSON and
//! renderable as plain text.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use valuelab_core::domain::{Country, Ticker};
use valuelab_core::stats::PriceSummary;
use valuelab_core::valuation::{
    Conclusion, CostOfCapital, CostOfEquity, EquityBridge, FreeCashFlowEstimate, GrowthRate,
    Projection, Recommendation, TerminalDiscounting,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationReport {
    pub ticker: Ticker,
    pub company_name: String,
    pub currency: String,
    pub country: Country,
    pub benchmark: String,
    pub valuation_date: NaiveDate,
    pub current_price: f64,
    pub free_cash_flows: FreeCashFlowEstimate,
    pub growth: GrowthRate,
    pub cost_of_capital: CostOfCapital,
    pub terminal_discounting: TerminalDiscounting,
    pub projection: Projection,
    pub equity: EquityBridge,
    pub fair_value_per_share: f64,
    pub recommendation: Recommendation,
    pub conclusion: Conclusion,
    pub price_summary: PriceSummary,
    /// BLAKE3 digest of the provider inputs.
    pub input_fingerprint: String,
    pub warnings: Vec<String>,
}

impl ValuationReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Upside of fair value over the current price, as a fraction.
    pub fn margin_of_safety(&self) -> f64 {
        self.fair_value_per_share / self.current_price - 1.0
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = self.write_text(&mut out);
        out
    }

    fn write_text(&self, out: &mut String) -> std::fmt::Result {
        let cur = &self.currency;

        writeln!(out, "=== DCF Valuation ===")?;
        writeln!(out, "Company:        {} ({})", self.company_name, self.ticker)?;
        writeln!(out, "Country:        {}", self.country)?;
        writeln!(out, "Benchmark:      {}", self.benchmark)?;
        writeln!(out, "Date:           {}", self.valuation_date)?;
        writeln!(out)?;

        writeln!(out, "--- Free Cash Flow (latest first) ---")?;
        writeln!(
            out,
            "{:<6} {:>14} {:>12} {:>12} {:>12} {:>12} {:>14}",
            "Year", "EBIT", "Tax", "D&A", "CapEx", "dNWC", "FCF"
        )?;
        for (i, y) in self.free_cash_flows.years.iter().enumerate() {
            writeln!(
                out,
                "{:<6} {:>14.0} {:>12.0} {:>12.0} {:>12.0} {:>12.0} {:>14.0}",
                format!("t-{i}"),
                y.ebit,
                y.tax_expense,
                y.depreciation_amortization,
                y.capital_expenditure,
                y.delta_nwc,
                y.free_cash_flow
            )?;
        }
        writeln!(
            out,
            "Growth:         {:.2}% ({:?}; g1 {:.2}%, g2 {:.2}%)",
            self.growth.rate * 100.0,
            self.growth.branch,
            self.growth.g1 * 100.0,
            self.growth.g2 * 100.0
        )?;
        writeln!(out)?;

        let coc = &self.cost_of_capital;
        writeln!(out, "--- Cost of Capital ---")?;
        writeln!(out, "Risk-free:      {:.2}%", coc.risk_free_rate * 100.0)?;
        match &coc.cost_of_equity {
            CostOfEquity::Capm {
                beta,
                market_return,
                rate,
            } => writeln!(
                out,
                "Cost of equity: {:.2}% (CAPM, beta {beta:.2}, market {:.2}%)",
                rate * 100.0,
                market_return * 100.0
            )?,
            CostOfEquity::HistoricalMean { symbol, rate } => writeln!(
                out,
                "Cost of equity: {:.2}% (mean annual return of {symbol})",
                rate * 100.0
            )?,
        }
        writeln!(
            out,
            "Cost of debt:   {:.2}% (coverage {:.2}x, spread {:.2}%)",
            coc.cost_of_debt.rate * 100.0,
            coc.cost_of_debt.coverage_ratio,
            coc.cost_of_debt.spread * 100.0
        )?;
        writeln!(
            out,
            "Weights:        equity {:.1}%, debt {:.1}%",
            coc.capital_structure.equity_ratio * 100.0,
            coc.capital_structure.debt_ratio * 100.0
        )?;
        writeln!(out, "Tax rate:       {:.2}%", coc.tax_rate * 100.0)?;
        writeln!(out, "WACC:           {:.2}%", coc.wacc * 100.0)?;
        writeln!(out)?;

        writeln!(out, "--- Projection ---")?;
        writeln!(
            out,
            "{:<6} {:>16} {:>10} {:>16}",
            "Year", "FCF", "Factor", "Present value"
        )?;
        for y in &self.projection.years {
            writeln!(
                out,
                "{:<6} {:>16.0} {:>10.4} {:>16.0}",
                y.year, y.projected_fcf, y.discount_factor, y.discounted_fcf
            )?;
        }
        writeln!(
            out,
            "{:<6} {:>16.0} {:>10} {:>16.0}",
            "TV", self.projection.terminal.value, "", self.projection.terminal.discounted
        )?;
        writeln!(
            out,
            "Gordon rate:    {:.2}%",
            self.projection.terminal.gordon_rate * 100.0
        )?;
        writeln!(out)?;

        writeln!(out, "--- Equity Bridge ---")?;
        writeln!(out, "Enterprise:     {:.0} {cur}", self.equity.enterprise_value)?;
        writeln!(out, "+ Cash:         {:.0} {cur}", self.equity.cash)?;
        writeln!(out, "- LT debt:      {:.0} {cur}", self.equity.long_term_debt)?;
        writeln!(out, "Equity:         {:.2} {cur}", self.equity.equity_value)?;
        writeln!(out, "Shares:         {:.0}", self.equity.shares_outstanding)?;
        writeln!(out)?;

        writeln!(out, "--- Result ---")?;
        writeln!(out, "Fair value:     {:.2} {cur}", self.fair_value_per_share)?;
        writeln!(out, "Current price:  {:.2} {cur}", self.current_price)?;
        writeln!(out, "Margin:         {:+.1}%", self.margin_of_safety() * 100.0)?;
        writeln!(out, "Recommendation: {}", self.recommendation)?;
        writeln!(out, "Conclusion:     the stock is {}", self.conclusion)?;
        writeln!(out)?;

        writeln!(
            out,
            "--- Trading {} to {} ---",
            self.price_summary.start, self.price_summary.end
        )?;
        writeln!(
            out,
            "{:<10} {:>14} {:>14} {:>14} {:>14} {:>14}",
            "", "Mean", "Std dev", "Variance", "Max", "Min"
        )?;
        for (label, stats) in self.price_summary.rows() {
            match stats {
                Some(s) => writeln!(
                    out,
                    "{:<10} {:>14.2} {:>14} {:>14} {:>14.2} {:>14.2}",
                    label,
                    s.mean,
                    optional(s.std_dev),
                    optional(s.variance),
                    s.max,
                    s.min
                )?,
                None => writeln!(out, "{label:<10} {:>14}", "no data")?,
            }
        }

        if !self.warnings.is_empty() {
            writeln!(out)?;
            writeln!(out, "--- Warnings ---")?;
            for w in &self.warnings {
                writeln!(out, "  - {w}")?;
            }
        }

        writeln!(out)?;
        writeln!(out, "Inputs:         {}", self.input_fingerprint)?;
        Ok(())
    }
}

fn optional(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.2}")).unwrap_or_else(|| "-".to_string())
}
