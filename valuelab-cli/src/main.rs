//! ValueLab CLI: discounted cash flow valuation from the terminal.
//!
//! Commands:
//! - `value` — value a ticker (prompts when none is given)
//! - `check` — screen a ticker for DCF suitability only
//! - `benchmark` — show the benchmark index used for a country
//! - `fetch` — snapshot a ticker's data into an offline bundle

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use valuelab_core::data::{
    CircuitBreaker, FinancialHistoryProvider, LocalBundleProvider, MarketDataProvider,
    YahooOptions, YahooProvider,
};
use valuelab_core::domain::{Country, Ticker, DEFAULT_BENCHMARK};
use valuelab_core::valuation::Suitability;
use valuelab_core::ErrorKind;
use valuelab_runner::{
    check_ticker, export_bundle, run_valuation, PipelineError, ValuationConfig, ValuationReport,
};

#[derive(Parser)]
#[command(
    name = "valuelab",
    version,
    about = "ValueLab CLI — DCF fair value and buy/hold/sell call for listed companies"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Value a company. Prompts for a ticker when none is given.
    Value {
        /// Ticker symbol (e.g., AAPL, NESN.SW, 7203.T).
        ticker: Option<String>,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Read data from an offline bundle directory instead of Yahoo Finance.
        #[arg(long)]
        bundle: Option<PathBuf>,

        /// Print the report as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Check whether a DCF valuation is appropriate for a company.
    Check {
        ticker: String,

        /// Read data from an offline bundle directory instead of Yahoo Finance.
        #[arg(long)]
        bundle: Option<PathBuf>,
    },
    /// Print the benchmark index used for a country of domicile.
    Benchmark {
        /// Country name as reported by Yahoo Finance (e.g., "United States").
        country: String,
    },
    /// Download a company's data from Yahoo Finance into an offline bundle.
    Fetch {
        ticker: String,

        /// Bundle directory. Defaults to ./bundle.
        #[arg(long, default_value = "bundle")]
        out: PathBuf,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Where statements, quotes and prices come from.
enum Source {
    Yahoo(YahooProvider),
    Bundle(LocalBundleProvider),
}

impl Source {
    fn open(bundle: Option<&Path>, config: &ValuationConfig) -> Result<Self> {
        match bundle {
            Some(dir) => {
                if !dir.is_dir() {
                    bail!("bundle directory does not exist: {}", dir.display());
                }
                Ok(Source::Bundle(LocalBundleProvider::new(dir)))
            }
            None => Ok(Source::Yahoo(yahoo(config)?)),
        }
    }

    fn financials(&self) -> &dyn FinancialHistoryProvider {
        match self {
            Source::Yahoo(p) => p,
            Source::Bundle(p) => p,
        }
    }

    fn market(&self) -> &dyn MarketDataProvider {
        match self {
            Source::Yahoo(p) => p,
            Source::Bundle(p) => p,
        }
    }
}

fn yahoo(config: &ValuationConfig) -> Result<YahooProvider> {
    let options = YahooOptions {
        timeout: config.http_timeout(),
        max_retries: config.max_retries,
        ..YahooOptions::default()
    };
    YahooProvider::new(Arc::new(CircuitBreaker::default_provider()), options)
        .context("failed to create Yahoo Finance client")
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Value {
            ticker,
            config,
            bundle,
            json,
        } => run_value(ticker, config, bundle, json),
        Commands::Check { ticker, bundle } => run_check(&ticker, bundle),
        Commands::Benchmark { country } => {
            run_benchmark(&country);
            Ok(())
        }
        Commands::Fetch {
            ticker,
            out,
            config,
        } => run_fetch(&ticker, &out, config),
    }
}

/// Logs go to stderr; `RUST_LOG` filters, `RUST_LOG_FORMAT=json` switches
/// to structured output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn,hyper_util=warn"));
    let json = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&Path>) -> Result<ValuationConfig> {
    let mut config = match path {
        Some(p) => ValuationConfig::from_file(p)?,
        None => ValuationConfig::default(),
    };
    config.apply_env_overrides()?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

// ── value ────────────────────────────────────────────────────────────

fn run_value(
    ticker: Option<String>,
    config_path: Option<PathBuf>,
    bundle: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path.as_deref())?;
    let source = Source::open(bundle.as_deref(), &config)?;

    let report = match ticker {
        Some(input) => {
            let ticker = Ticker::parse(&input).map_err(PipelineError::from)?;
            value_once(&ticker, &source, &config)?
        }
        None => prompt_until_valued(&source, &config)?,
    };

    if json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.render_text());
    }
    Ok(())
}

fn value_once(
    ticker: &Ticker,
    source: &Source,
    config: &ValuationConfig,
) -> Result<ValuationReport, PipelineError> {
    run_valuation(ticker, source.financials(), source.market(), config, today())
}

/// Ask for tickers until one can be valued. Input errors re-prompt; any
/// other failure ends the session.
fn prompt_until_valued(source: &Source, config: &ValuationConfig) -> Result<ValuationReport> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("Enter a ticker: ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            bail!("no ticker entered");
        };
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let attempt = Ticker::parse(&line)
            .map_err(PipelineError::from)
            .and_then(|ticker| value_once(&ticker, source, config));

        match attempt {
            Ok(report) => return Ok(report),
            Err(e) if e.kind().is_retryable_by_user() => {
                eprintln!("{e}. Please enter a valid ticker.");
            }
            Err(e) => return Err(describe(e)),
        }
    }
}

fn describe(e: PipelineError) -> anyhow::Error {
    let kind = e.kind();
    match kind {
        ErrorKind::DomainMismatch => anyhow::Error::new(e).context("cannot value this instrument"),
        _ => anyhow::Error::new(e).context(format!("{kind} error")),
    }
}

// ── check ────────────────────────────────────────────────────────────

fn run_check(input: &str, bundle: Option<PathBuf>) -> Result<()> {
    let ticker = Ticker::parse(input).map_err(PipelineError::from)?;
    let config = load_config(None)?;
    let source = Source::open(bundle.as_deref(), &config)?;

    let suitability = check_ticker(&ticker, source.financials()).map_err(describe)?;
    println!("{ticker}: {}", suitability.message());
    if let Suitability::NotAppropriate { missing } = &suitability {
        let items: Vec<&str> = missing.iter().map(|m| m.label()).collect();
        println!("Not reported: {}", items.join(", "));
    }
    Ok(())
}

// ── benchmark ────────────────────────────────────────────────────────

fn run_benchmark(name: &str) {
    let country = Country::from_name(name);
    let symbol = country.benchmark_symbol();
    if symbol == DEFAULT_BENCHMARK {
        println!("{}: {symbol} (default, MSCI World)", name.trim());
    } else {
        println!("{country}: {symbol}");
    }
}

// ── fetch ────────────────────────────────────────────────────────────

fn run_fetch(input: &str, out: &Path, config_path: Option<PathBuf>) -> Result<()> {
    let ticker = Ticker::parse(input).map_err(PipelineError::from)?;
    let config = load_config(config_path.as_deref())?;
    let provider = yahoo(&config)?;
    let bundle = LocalBundleProvider::new(out);

    let summary = export_bundle(&ticker, &provider, &provider, &config, today(), &bundle)
        .map_err(describe)?;

    println!("Bundle written to: {}", out.display());
    println!("Statements:     {} fiscal years", summary.statement_years);
    for (symbol, bars) in &summary.series {
        println!("{:<15} {bars} bars", format!("{symbol}:"));
    }
    Ok(())
}
