//! Serializable valuation configuration.
//!
//! Every field has a default, so an empty TOML file (or none at all) yields
//! the standard model. Environment variables override the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use valuelab_core::valuation::TerminalDiscounting;
use valuelab_core::ErrorKind;

pub const ENV_RISK_FREE_RATE: &str = "VALUELAB_RISK_FREE_RATE";
pub const ENV_PERPETUAL_RATE: &str = "VALUELAB_PERPETUAL_RATE";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "VALUELAB_HTTP_TIMEOUT_SECS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {var}: '{value}'")]
    Env { var: &'static str, value: String },

    #[error("invalid config: {field} {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Configuration
    }
}

/// Which price series stands in for the cost of equity when the company
/// publishes no beta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReturnSeries {
    /// Mean annual return of the stock itself.
    #[default]
    Stock,
    /// Mean annual return of the domicile benchmark.
    Benchmark,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationConfig {
    pub risk_free_rate: f64,

    /// Long-run growth rate after the explicit forecast.
    pub perpetual_rate: f64,

    /// Years of daily prices behind the annual return averages.
    pub return_lookback_years: u32,

    /// Trailing window for the trading summary.
    pub summary_window_days: u32,

    pub http_timeout_secs: u64,
    pub max_retries: u32,

    /// Pin the benchmark instead of deriving it from the domicile.
    pub benchmark_override: Option<String>,

    pub terminal_discounting: TerminalDiscounting,
    pub fallback_return_series: FallbackReturnSeries,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.016,
            perpetual_rate: 0.03,
            return_lookback_years: 5,
            summary_window_days: 365,
            http_timeout_secs: 30,
            max_retries: 3,
            benchmark_override: None,
            terminal_discounting: TerminalDiscounting::Single,
            fallback_return_series: FallbackReturnSeries::Stock,
        }
    }
}

impl ValuationConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Apply `VALUELAB_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Apply overrides from any variable lookup, then re-validate.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&'static str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(v) = lookup(ENV_RISK_FREE_RATE) {
            self.risk_free_rate = parse_env(ENV_RISK_FREE_RATE, &v)?;
        }
        if let Some(v) = lookup(ENV_PERPETUAL_RATE) {
            self.perpetual_rate = parse_env(ENV_PERPETUAL_RATE, &v)?;
        }
        if let Some(v) = lookup(ENV_HTTP_TIMEOUT_SECS) {
            self.http_timeout_secs = parse_env(ENV_HTTP_TIMEOUT_SECS, &v)?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        rate_in("risk_free_rate", self.risk_free_rate, -0.5, 0.5)?;
        rate_in("perpetual_rate", self.perpetual_rate, 0.0, 0.5)?;
        if self.perpetual_rate == 0.0 {
            return invalid("perpetual_rate", "must be above zero");
        }
        if !(1..=50).contains(&self.return_lookback_years) {
            return invalid("return_lookback_years", "must be between 1 and 50");
        }
        if self.summary_window_days == 0 {
            return invalid("summary_window_days", "must be at least 1");
        }
        if self.http_timeout_secs == 0 {
            return invalid("http_timeout_secs", "must be at least 1");
        }
        if self.max_retries > 10 {
            return invalid("max_retries", "must be 10 or fewer");
        }
        if let Some(symbol) = &self.benchmark_override {
            if symbol.trim().is_empty() {
                return invalid("benchmark_override", "must not be empty");
            }
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env {
        var,
        value: value.to_string(),
    })
}

fn rate_in(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < min || value > max {
        return invalid(field, format!("{value} is outside [{min}, {max}]"));
    }
    Ok(())
}

fn invalid(field: &'static str, reason: impl Into<String>) -> Result<(), ConfigError> {
    Err(ConfigError::Invalid {
        field,
        reason: reason.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_toml_is_default() {
        let config = ValuationConfig::from_toml("").unwrap();
        assert_eq!(config, ValuationConfig::default());
        assert_eq!(config.risk_free_rate, 0.016);
        assert_eq!(config.perpetual_rate, 0.03);
        assert_eq!(config.terminal_discounting, TerminalDiscounting::Single);
    }

    #[test]
    fn toml_roundtrip() {
        let config = ValuationConfig {
            benchmark_override: Some("^STOXX50E".into()),
            terminal_discounting: TerminalDiscounting::Compounded,
            fallback_return_series: FallbackReturnSeries::Benchmark,
            ..ValuationConfig::default()
        };
        let text = config.to_toml().unwrap();
        assert!(text.contains("terminal_discounting = \"compounded\""));
        assert_eq!(ValuationConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = ValuationConfig::from_toml("risk_free_rate = 0.04\n").unwrap();
        assert_eq!(config.risk_free_rate, 0.04);
        assert_eq!(config.return_lookback_years, 5);
    }

    #[test]
    fn from_file_reads_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("valuelab.toml");
        std::fs::write(&path, "perpetual_rate = 0.025\nfallback_return_series = \"benchmark\"\n").unwrap();
        let config = ValuationConfig::from_file(&path).unwrap();
        assert_eq!(config.perpetual_rate, 0.025);
        assert_eq!(config.fallback_return_series, FallbackReturnSeries::Benchmark);

        let missing = ValuationConfig::from_file(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(matches!(
            ValuationConfig::from_toml("perpetual_rate = 0.0"),
            Err(ConfigError::Invalid { field: "perpetual_rate", .. })
        ));
        assert!(matches!(
            ValuationConfig::from_toml("risk_free_rate = 2.0"),
            Err(ConfigError::Invalid { field: "risk_free_rate", .. })
        ));
        assert!(matches!(
            ValuationConfig::from_toml("return_lookback_years = 0"),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            ValuationConfig::from_toml("benchmark_override = \" \""),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            ValuationConfig::from_toml("risk_free_rate = \"high\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn overrides_replace_file_values() {
        let vars: HashMap<&str, &str> = [
            (ENV_RISK_FREE_RATE, "0.02"),
            (ENV_HTTP_TIMEOUT_SECS, "5"),
        ]
        .into_iter()
        .collect();
        let mut config = ValuationConfig::default();
        config
            .apply_overrides(|var| vars.get(var).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.risk_free_rate, 0.02);
        assert_eq!(config.http_timeout(), Duration::from_secs(5));
        assert_eq!(config.perpetual_rate, 0.03);
    }

    #[test]
    fn bad_override_is_rejected() {
        let mut config = ValuationConfig::default();
        let err = config
            .apply_overrides(|var| (var == ENV_PERPETUAL_RATE).then(|| "three".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: ENV_PERPETUAL_RATE, .. }));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
