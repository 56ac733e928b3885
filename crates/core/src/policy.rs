//! Deployment policy for the loan-suggestion feature.
//!
//! Resolution is a pure, total function: every deployment identifier maps to
//! a bounded policy record, and anything unrecognized falls back to the
//! permissive development default.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionVisibility {
    Off,
    Internal,
    Ui,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanPolicy {
    pub enabled: bool,
    pub visibility: SuggestionVisibility,
    pub min_loan_amount: Decimal,
    pub max_loan_amount: Decimal,
    pub rounding_increment: Decimal,
}

impl LoanPolicy {
    pub fn development() -> Self {
        Self {
            enabled: true,
            visibility: SuggestionVisibility::Ui,
            min_loan_amount: Decimal::from(1_000),
            max_loan_amount: Decimal::from(1_000_000),
            rounding_increment: Decimal::from(100),
        }
    }
}

pub fn resolve(deployment: &str) -> LoanPolicy {
    match deployment {
        "production" => LoanPolicy {
            enabled: true,
            visibility: SuggestionVisibility::Ui,
            min_loan_amount: Decimal::from(5_000),
            max_loan_amount: Decimal::from(500_000),
            rounding_increment: Decimal::from(1_000),
        },
        "pilot" => LoanPolicy {
            enabled: true,
            visibility: SuggestionVisibility::Internal,
            min_loan_amount: Decimal::from(5_000),
            max_loan_amount: Decimal::from(150_000),
            rounding_increment: Decimal::from(500),
        },
        "staging" => LoanPolicy {
            enabled: true,
            visibility: SuggestionVisibility::Internal,
            min_loan_amount: Decimal::from(1_000),
            max_loan_amount: Decimal::from(1_000_000),
            rounding_increment: Decimal::from(500),
        },
        _ => LoanPolicy::development(),
    }
}
