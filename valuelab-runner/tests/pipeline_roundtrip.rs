//! End-to-end pipeline tests over in-memory providers.
//!
//! Tests:
//! 1. A fixed fixture reproduces the same fair value and fingerprint, pinned
//!    to golden values
//! 2. Banks are rejected before any price series is fetched
//! 3. Invalid and unknown tickers are input validation errors
//! 4. Cost of equity fallback when no beta is published
//! 5. Terminal discounting switch
//! 6. Upstream failures surface with the right kind

mod common;

use common::*;
use proptest::prelude::*;
use valuelab_core::domain::Ticker;
use valuelab_core::valuation::{
    recommend, Conclusion, CostOfEquity, GrowthBranch, Recommendation, Suitability,
    TerminalDiscounting,
};
use valuelab_core::ErrorKind;
use valuelab_runner::{
    check_ticker, run_valuation, FallbackReturnSeries, PipelineError, ValuationConfig,
};

fn acme() -> Ticker {
    Ticker::parse("ACME").unwrap()
}

// ── 1. Determinism ───────────────────────────────────────────────────

#[test]
fn fixture_is_bit_exact_across_runs() {
    let financials = FakeFinancials::new().with(acme_quote(Some(1.1)), acme_history());
    let market = acme_market();
    let config = ValuationConfig::default();

    let first = run_valuation(&acme(), &financials, &market, &config, today()).unwrap();
    let second = run_valuation(&acme(), &financials, &market, &config, today()).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    assert_eq!(first.input_fingerprint.len(), 64);

    assert_eq!(first.free_cash_flows.series.values(), &[889.0, 812.0, 752.5]);
    assert_eq!(first.growth.branch, GrowthBranch::Decelerating);
    assert_eq!(first.growth.rate, first.growth.g2);
    assert_eq!(first.benchmark, "^GSPC");
    assert!(matches!(
        first.cost_of_capital.cost_of_equity,
        CostOfEquity::Capm { beta, .. } if beta == 1.1
    ));
    assert_eq!(first.cost_of_capital.cost_of_debt.spread, 0.015);
    assert_eq!(first.projection.discounted_entries().len(), 6);

    let fair = first.fair_value_per_share;
    assert!(fair > 0.0);
    assert_eq!(fair, (fair * 100.0).round() / 100.0);
    assert_eq!(first.recommendation, recommend(fair, 30.0));
    assert!(first.warnings.is_empty(), "{:?}", first.warnings);
}

#[test]
fn fixture_matches_golden_values() {
    let financials = FakeFinancials::new().with(acme_quote(Some(1.1)), acme_history());
    let report = run_valuation(
        &acme(),
        &financials,
        &acme_market(),
        &ValuationConfig::default(),
        today(),
    )
    .unwrap();

    let coc = &report.cost_of_capital;
    assert!((coc.cost_of_equity.rate() - 0.077_782_619_711_271_5).abs() < 1e-12);
    assert!((coc.tax_rate - 240.0 / 1140.0).abs() < 1e-15);
    assert!((coc.wacc - 0.056_459_045_510_973_4).abs() < 1e-12);
    assert_eq!(report.projection.terminal.gordon_rate, 0.03);
    assert!((report.equity.equity_value - 38_370.096_036_138).abs() < 1e-6);

    assert_eq!(report.fair_value_per_share, 38.37);
    assert_eq!(report.recommendation, Recommendation::Buy);
    assert_eq!(report.conclusion, Conclusion::HighlyUndervalued);
}

#[test]
fn golden_fair_values_for_each_mode() {
    let compounded = {
        let financials = FakeFinancials::new().with(acme_quote(Some(1.1)), acme_history());
        let config = ValuationConfig {
            terminal_discounting: TerminalDiscounting::Compounded,
            ..ValuationConfig::default()
        };
        run_valuation(&acme(), &financials, &acme_market(), &config, today()).unwrap()
    };
    assert_eq!(compounded.fair_value_per_share, 15.75);

    let no_beta = {
        let financials = FakeFinancials::new().with(acme_quote(None), acme_history());
        run_valuation(&acme(), &financials, &acme_market(), &ValuationConfig::default(), today())
            .unwrap()
    };
    assert!((no_beta.cost_of_capital.wacc - 0.063_888_698_551_407_5).abs() < 1e-12);
    assert_eq!(no_beta.fair_value_per_share, 33.34);
}

#[test]
fn report_renders_all_sections() {
    let financials = FakeFinancials::new().with(acme_quote(Some(1.1)), acme_history());
    let report = run_valuation(
        &acme(),
        &financials,
        &acme_market(),
        &ValuationConfig::default(),
        today(),
    )
    .unwrap();

    let text = report.render_text();
    for heading in [
        "Free Cash Flow",
        "Cost of Capital",
        "Projection",
        "Equity Bridge",
        "Recommendation:",
        "Adj Close",
    ] {
        assert!(text.contains(heading), "missing {heading}");
    }
    assert!(text.contains(&report.input_fingerprint));

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["ticker"], "ACME");
    assert_eq!(json["terminal_discounting"], "single");
}

#[test]
fn price_summary_covers_trailing_year() {
    let financials = FakeFinancials::new().with(acme_quote(Some(1.1)), acme_history());
    let report = run_valuation(
        &acme(),
        &financials,
        &acme_market(),
        &ValuationConfig::default(),
        today(),
    )
    .unwrap();

    let summary = &report.price_summary;
    assert_eq!(summary.end, today());
    assert_eq!(summary.start, d(2023, 6, 29));
    let close = summary.close.unwrap();
    assert!(close.count >= 52 && close.count <= 53);
    assert!(close.std_dev.is_some());
}

// ── 2. Suitability ───────────────────────────────────────────────────

#[test]
fn bank_is_rejected_before_prices() {
    let financials = FakeFinancials::new().with(acme_quote(Some(1.1)), bank_history());
    let market = acme_market();

    let err = run_valuation(&acme(), &financials, &market, &ValuationConfig::default(), today())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DomainMismatch);
    assert!(err.to_string().contains("not appropriate"));
    assert!(market.requested().is_empty());

    let suitability = check_ticker(&acme(), &financials).unwrap();
    assert!(matches!(suitability, Suitability::NotAppropriate { ref missing } if missing.len() == 2));
}

#[test]
fn check_rejects_short_history() {
    let short = valuelab_core::domain::StatementHistory::new(acme_history().years()[..2].to_vec());
    let financials = FakeFinancials::new().with(acme_quote(Some(1.1)), short);

    let err = check_ticker(&acme(), &financials).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamData);
    let valued =
        run_valuation(&acme(), &financials, &acme_market(), &ValuationConfig::default(), today())
            .unwrap_err();
    assert_eq!(valued.kind(), err.kind());
}

#[test]
fn check_accepts_industrial_company() {
    let financials = FakeFinancials::new().with(acme_quote(None), acme_history());
    assert_eq!(check_ticker(&acme(), &financials).unwrap(), Suitability::Appropriate);
}

// ── 3. Input validation ──────────────────────────────────────────────

#[test]
fn malformed_ticker_is_input_validation() {
    let err: PipelineError = Ticker::parse("$$$").unwrap_err().into();
    assert_eq!(err.kind(), ErrorKind::InputValidation);
    assert!(err.kind().is_retryable_by_user());
}

#[test]
fn unknown_ticker_is_input_validation() {
    let financials = FakeFinancials::new().with(acme_quote(Some(1.1)), acme_history());
    let err = run_valuation(
        &Ticker::parse("ZZZZ").unwrap(),
        &financials,
        &acme_market(),
        &ValuationConfig::default(),
        today(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InputValidation);
}

#[test]
fn non_positive_price_is_input_validation() {
    let mut quote = acme_quote(Some(1.1));
    quote.previous_close = 0.0;
    let financials = FakeFinancials::new().with(quote, acme_history());
    let err = run_valuation(&acme(), &financials, &acme_market(), &ValuationConfig::default(), today())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InputValidation);
}

// ── 4. Cost of equity fallback ───────────────────────────────────────

#[test]
fn missing_beta_uses_stock_returns_by_default() {
    let financials = FakeFinancials::new().with(acme_quote(None), acme_history());
    let market = acme_market();
    let report =
        run_valuation(&acme(), &financials, &market, &ValuationConfig::default(), today()).unwrap();

    assert!(matches!(
        &report.cost_of_capital.cost_of_equity,
        CostOfEquity::HistoricalMean { symbol, .. } if symbol == "ACME"
    ));
    assert_eq!(market.requested(), vec!["ACME".to_string()]);
    assert!(report.warnings.iter().any(|w| w.contains("no beta")));
}

#[test]
fn missing_beta_can_fall_back_to_benchmark() {
    let financials = FakeFinancials::new().with(acme_quote(None), acme_history());
    let config = ValuationConfig {
        fallback_return_series: FallbackReturnSeries::Benchmark,
        ..ValuationConfig::default()
    };
    let report = run_valuation(&acme(), &financials, &acme_market(), &config, today()).unwrap();
    assert!(matches!(
        &report.cost_of_capital.cost_of_equity,
        CostOfEquity::HistoricalMean { symbol, .. } if symbol == "^GSPC"
    ));
}

#[test]
fn benchmark_override_is_used() {
    let financials = FakeFinancials::new().with(acme_quote(Some(0.9)), acme_history());
    let market = acme_market().with("MWL=F", weekly_bars(80.0, 0.06));
    let config = ValuationConfig {
        benchmark_override: Some("MWL=F".into()),
        ..ValuationConfig::default()
    };
    let report = run_valuation(&acme(), &financials, &market, &config, today()).unwrap();
    assert_eq!(report.benchmark, "MWL=F");
    assert!(market.requested().contains(&"MWL=F".to_string()));
}

// ── 5. Terminal discounting ──────────────────────────────────────────

#[test]
fn compounded_terminal_discount_lowers_fair_value() {
    let financials = FakeFinancials::new().with(acme_quote(Some(1.1)), acme_history());
    let single = run_valuation(
        &acme(),
        &financials,
        &acme_market(),
        &ValuationConfig::default(),
        today(),
    )
    .unwrap();
    let compounded = run_valuation(
        &acme(),
        &financials,
        &acme_market(),
        &ValuationConfig {
            terminal_discounting: TerminalDiscounting::Compounded,
            ..ValuationConfig::default()
        },
        today(),
    )
    .unwrap();

    assert_eq!(single.projection.terminal.value, compounded.projection.terminal.value);
    assert!(compounded.fair_value_per_share < single.fair_value_per_share);
    assert_eq!(single.input_fingerprint, compounded.input_fingerprint);
}

// ── 6. Upstream failures ─────────────────────────────────────────────

#[test]
fn short_history_is_upstream_data() {
    let history = acme_history();
    let short = valuelab_core::domain::StatementHistory::new(history.years()[..3].to_vec());
    let financials = FakeFinancials::new().with(acme_quote(Some(1.1)), short);
    let err = run_valuation(&acme(), &financials, &acme_market(), &ValuationConfig::default(), today())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamData);
}

#[test]
fn missing_benchmark_series_is_upstream_data() {
    let financials = FakeFinancials::new().with(acme_quote(Some(1.1)), acme_history());
    let market = FakeMarket::new().with("ACME", weekly_bars(20.0, 0.10));
    let err = run_valuation(&acme(), &financials, &market, &ValuationConfig::default(), today())
        .unwrap_err();
    assert!(matches!(err, PipelineError::Data(_)));
    assert_eq!(err.kind(), ErrorKind::UpstreamData);
    assert!(err.to_string().contains("^GSPC"));
}

#[test]
fn invalid_config_is_rejected() {
    let financials = FakeFinancials::new().with(acme_quote(Some(1.1)), acme_history());
    let config = ValuationConfig {
        perpetual_rate: f64::NAN,
        ..ValuationConfig::default()
    };
    let err = run_valuation(&acme(), &financials, &acme_market(), &config, today()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// The report's call always agrees with the fair value it prints.
    #[test]
    fn recommendation_matches_fair_value(price in 1.0..200.0_f64) {
        let mut quote = acme_quote(Some(1.1));
        quote.previous_close = price;
        let financials = FakeFinancials::new().with(quote, acme_history());
        let report = run_valuation(
            &acme(),
            &financials,
            &acme_market(),
            &ValuationConfig::default(),
            today(),
        )
        .unwrap();
        prop_assert_eq!(report.recommendation, recommend(report.fair_value_per_share, price));
        prop_assert_eq!(report.current_price, price);
    }
}
