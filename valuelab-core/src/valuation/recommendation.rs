//! Recommendation and valuation conclusion from fair value vs. price.
//!
//! Every threshold is a strict `>` (or `<`) comparison evaluated in order;
//! a fair value sitting exactly on a boundary falls through to the next rule.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Buy,
    Hold,
    Sell,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Recommendation::Buy => "BUY",
            Recommendation::Hold => "HOLD",
            Recommendation::Sell => "SELL",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conclusion {
    HighlyUndervalued,
    SlightlyUndervalued,
    EfficientPricing,
    SlightlyOvervalued,
    HighlyOvervalued,
}

impl fmt::Display for Conclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Conclusion::HighlyUndervalued => "highly undervalued",
            Conclusion::SlightlyUndervalued => "slightly undervalued",
            Conclusion::EfficientPricing => "efficient pricing",
            Conclusion::SlightlyOvervalued => "slightly overvalued",
            Conclusion::HighlyOvervalued => "highly overvalued",
        })
    }
}

pub fn recommend(fair_value: f64, current_price: f64) -> Recommendation {
    if fair_value > 1.09 * current_price {
        Recommendation::Buy
    } else if fair_value > current_price {
        Recommendation::Hold
    } else if fair_value > 0.91 * current_price {
        Recommendation::Hold
    } else if fair_value < current_price {
        Recommendation::Sell
    } else {
        Recommendation::Hold
    }
}

pub fn conclude(fair_value: f64, current_price: f64) -> Conclusion {
    if fair_value > 1.17 * current_price {
        Conclusion::HighlyUndervalued
    } else if fair_value > 1.05 * current_price {
        Conclusion::SlightlyUndervalued
    } else if fair_value > current_price || fair_value > 0.95 * current_price {
        Conclusion::EfficientPricing
    } else if fair_value > 0.86 * current_price {
        Conclusion::SlightlyOvervalued
    } else if fair_value < current_price {
        Conclusion::HighlyOvervalued
    } else {
        Conclusion::EfficientPricing
    }
}

pub fn assess(fair_value: f64, current_price: f64) -> (Recommendation, Conclusion) {
    (
        recommend(fair_value, current_price),
        conclude(fair_value, current_price),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_at_109_percent_is_hold() {
        assert_eq!(recommend(109.0, 100.0), Recommendation::Hold);
        assert_eq!(recommend(109.01, 100.0), Recommendation::Buy);
    }

    #[test]
    fn recommendation_bands() {
        assert_eq!(recommend(150.0, 100.0), Recommendation::Buy);
        assert_eq!(recommend(105.0, 100.0), Recommendation::Hold);
        assert_eq!(recommend(95.0, 100.0), Recommendation::Hold);
        assert_eq!(recommend(91.0, 100.0), Recommendation::Sell);
        assert_eq!(recommend(50.0, 100.0), Recommendation::Sell);
    }

    #[test]
    fn equal_values_hold() {
        assert_eq!(recommend(100.0, 100.0), Recommendation::Hold);
    }

    #[test]
    fn conclusion_bands() {
        assert_eq!(conclude(120.0, 100.0), Conclusion::HighlyUndervalued);
        assert_eq!(conclude(110.0, 100.0), Conclusion::SlightlyUndervalued);
        assert_eq!(conclude(102.0, 100.0), Conclusion::EfficientPricing);
        assert_eq!(conclude(96.0, 100.0), Conclusion::EfficientPricing);
        assert_eq!(conclude(90.0, 100.0), Conclusion::SlightlyOvervalued);
        assert_eq!(conclude(80.0, 100.0), Conclusion::HighlyOvervalued);
        assert_eq!(conclude(100.0, 100.0), Conclusion::EfficientPricing);
    }

    #[test]
    fn conclusion_boundaries_are_strict() {
        assert_eq!(conclude(117.0, 100.0), Conclusion::SlightlyUndervalued);
        assert_eq!(conclude(86.0, 100.0), Conclusion::HighlyOvervalued);
    }

    #[test]
    fn labels() {
        assert_eq!(Recommendation::Buy.to_string(), "BUY");
        assert_eq!(Conclusion::SlightlyOvervalued.to_string(), "slightly overvalued");
        assert_eq!(
            serde_json::to_string(&Recommendation::Sell).unwrap(),
            "\"SELL\""
        );
    }
}
