//! Screening for companies a DCF cannot value.
//!
//! Financial institutions report neither inventory nor capital expenditure.
//! The screen looks at the prior fiscal year (index 1) so a partially filed
//! latest year does not trip it.

use super::ValuationError;
use crate::domain::{LineItem, StatementHistory};
use serde::{Deserialize, Serialize};

const SCREEN_YEAR: usize = 1;
const SCREENED_ITEMS: [LineItem; 2] = [LineItem::Inventory, LineItem::CapitalExpenditure];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Suitability {
    Appropriate,
    NotAppropriate { missing: Vec<LineItem> },
}

impl Suitability {
    pub fn is_appropriate(&self) -> bool {
        matches!(self, Suitability::Appropriate)
    }

    /// Convert a failed screen into the domain mismatch for its first
    /// missing item.
    pub fn into_result(self) -> Result<(), ValuationError> {
        match self {
            Suitability::Appropriate => Ok(()),
            Suitability::NotAppropriate { missing } => Err(ValuationError::DomainMismatch {
                item: missing.first().copied().unwrap_or(LineItem::Inventory),
                year: SCREEN_YEAR,
            }),
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Suitability::Appropriate => "DCF valuation is appropriate for the chosen stock",
            Suitability::NotAppropriate { .. } => {
                "DCF valuation is not appropriate for banks and financial institutions"
            }
        }
    }
}

pub fn check_suitability(history: &StatementHistory) -> Suitability {
    let missing: Vec<LineItem> = SCREENED_ITEMS
        .into_iter()
        .filter(|item| history.get(SCREEN_YEAR, *item).is_none())
        .collect();

    if missing.is_empty() {
        Suitability::Appropriate
    } else {
        Suitability::NotAppropriate { missing }
    }
}
