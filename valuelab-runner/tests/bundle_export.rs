//! Export to an offline bundle, then value from the bundle alone.

mod common;

use common::*;
use valuelab_core::data::LocalBundleProvider;
use valuelab_core::domain::Ticker;
use valuelab_core::ErrorKind;
use valuelab_runner::{export_bundle, run_valuation, ValuationConfig};

#[test]
fn bundle_reproduces_live_valuation() {
    let ticker = Ticker::parse("ACME").unwrap();
    let financials = FakeFinancials::new().with(acme_quote(Some(1.1)), acme_history());
    let market = acme_market();
    let config = ValuationConfig::default();

    let dir = tempfile::tempdir().unwrap();
    let bundle = LocalBundleProvider::new(dir.path());
    let summary = export_bundle(&ticker, &financials, &market, &config, today(), &bundle).unwrap();
    assert_eq!(summary.statement_years, 4);
    assert_eq!(summary.series.len(), 2);
    assert_eq!(summary.series[1].0, "^GSPC");

    assert!(dir.path().join("ACME").join("quote.toml").exists());
    assert!(dir.path().join("ACME").join("statements.csv").exists());
    assert!(dir.path().join("prices").join("^GSPC.csv").exists());

    let live = run_valuation(&ticker, &financials, &market, &config, today()).unwrap();
    let offline = run_valuation(&ticker, &bundle, &bundle, &config, today()).unwrap();

    assert_eq!(offline.fair_value_per_share, live.fair_value_per_share);
    assert_eq!(offline.input_fingerprint, live.input_fingerprint);
    assert_eq!(offline.recommendation, live.recommendation);
}

#[test]
fn no_beta_bundle_skips_benchmark() {
    let ticker = Ticker::parse("ACME").unwrap();
    let financials = FakeFinancials::new().with(acme_quote(None), acme_history());
    let market = FakeMarket::new().with("ACME", weekly_bars(20.0, 0.10));
    let config = ValuationConfig::default();

    let dir = tempfile::tempdir().unwrap();
    let bundle = LocalBundleProvider::new(dir.path());
    let summary = export_bundle(&ticker, &financials, &market, &config, today(), &bundle).unwrap();
    assert_eq!(summary.series.len(), 1);
    assert_eq!(summary.series[0].0, "ACME");
    assert_eq!(market.requested(), vec!["ACME".to_string()]);
    assert!(!dir.path().join("prices").join("^GSPC.csv").exists());

    let live = run_valuation(&ticker, &financials, &market, &config, today()).unwrap();
    let offline = run_valuation(&ticker, &bundle, &bundle, &config, today()).unwrap();
    assert_eq!(offline.fair_value_per_share, live.fair_value_per_share);
    assert_eq!(offline.input_fingerprint, live.input_fingerprint);
}

#[test]
fn bundle_without_ticker_is_input_validation() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = LocalBundleProvider::new(dir.path());
    let err = run_valuation(
        &Ticker::parse("NOPE").unwrap(),
        &bundle,
        &bundle,
        &ValuationConfig::default(),
        today(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InputValidation);
}
