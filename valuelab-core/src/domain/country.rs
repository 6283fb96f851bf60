//! Company domicile and the benchmark index used for its market return.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Benchmark used when the domicile has no dedicated index: MSCI World futures.
pub const DEFAULT_BENCHMARK: &str = "MWL=F";

/// Domiciles with a dedicated benchmark index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Country {
    UnitedStates,
    Switzerland,
    Germany,
    UnitedKingdom,
    France,
    Italy,
    Spain,
    Japan,
    /// Any other domicile, kept verbatim for the report.
    Other(String),
}

impl Country {
    /// Map the country name reported by the data provider.
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "United States" => Country::UnitedStates,
            "Switzerland" => Country::Switzerland,
            "Germany" => Country::Germany,
            "United Kingdom" => Country::UnitedKingdom,
            "France" => Country::France,
            "Italy" => Country::Italy,
            "Spain" => Country::Spain,
            "Japan" => Country::Japan,
            other => Country::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Country::UnitedStates => "United States",
            Country::Switzerland => "Switzerland",
            Country::Germany => "Germany",
            Country::UnitedKingdom => "United Kingdom",
            Country::France => "France",
            Country::Italy => "Italy",
            Country::Spain => "Spain",
            Country::Japan => "Japan",
            Country::Other(name) => name,
        }
    }

    /// Benchmark index symbol for this domicile.
    pub fn benchmark_symbol(&self) -> &'static str {
        match self {
            Country::UnitedStates => "^GSPC",
            Country::Switzerland => "^SSMI",
            Country::Germany => "^GDAXI",
            Country::UnitedKingdom => "^FTSE",
            Country::France => "^FCHI",
            Country::Italy => "FTSEMIB.MI",
            Country::Spain => "^IBEX",
            Country::Japan => "^N225",
            Country::Other(_) => DEFAULT_BENCHMARK,
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_domiciles_map_to_their_index() {
        let cases = [
            ("United States", "^GSPC"),
            ("Switzerland", "^SSMI"),
            ("Germany", "^GDAXI"),
            ("United Kingdom", "^FTSE"),
            ("France", "^FCHI"),
            ("Italy", "FTSEMIB.MI"),
            ("Spain", "^IBEX"),
            ("Japan", "^N225"),
        ];
        for (name, symbol) in cases {
            assert_eq!(Country::from_name(name).benchmark_symbol(), symbol, "{name}");
        }
    }

    #[test]
    fn unknown_domicile_falls_back_to_world_index() {
        let c = Country::from_name("Netherlands");
        assert_eq!(c, Country::Other("Netherlands".into()));
        assert_eq!(c.benchmark_symbol(), DEFAULT_BENCHMARK);
        assert_eq!(c.name(), "Netherlands");
    }

    #[test]
    fn empty_country_uses_default() {
        assert_eq!(Country::from_name("").benchmark_symbol(), "MWL=F");
    }
}
