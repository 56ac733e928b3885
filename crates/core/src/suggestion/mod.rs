pub mod engine;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::artifacts::{Confidence, CostBreakdownData, LoanSummaryData, RiskFlag};

pub use engine::compute_loan_suggestion;

/// One explainable step in the amount computation. The trail is ordered and
/// append-only; `base_amount` plus the summed impacts reconstructs the final
/// amount exactly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub reason: String,
    pub multiplier: Option<Decimal>,
    pub penalty: Option<Decimal>,
    pub impact: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoanSuggestionResult {
    pub suggested_amount: Decimal,
    pub base_amount: Decimal,
    pub adjustments: Vec<Adjustment>,
    pub disclaimers: Vec<String>,
    pub confidence: Confidence,
}

pub struct SuggestionInput<'a> {
    pub summary: &'a LoanSummaryData,
    pub breakdown: Option<&'a CostBreakdownData>,
    pub risk_flags: &'a [RiskFlag],
    pub missing_fields: &'a [String],
}
