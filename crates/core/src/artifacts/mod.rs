//! Derived artifacts: typed views computed from conversation state.
//!
//! Each builder is a pure function over `(slots, recent messages)`;
//! artifacts are recomputed per request and never stored as state. Only the
//! assembled bundle may be persisted, as an audit snapshot.

pub mod cost_breakdown;
pub mod loan_summary;
pub mod next_questions;
pub mod risk_flags;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::conversation::Message;
use crate::flow::definition::Audience;
use crate::flow::state::{is_present, numeric, SlotValues};
use crate::lang::Dialect;
use crate::policy::{LoanPolicy, SuggestionVisibility};
use crate::suggestion::{compute_loan_suggestion, LoanSuggestionResult, SuggestionInput};

pub use cost_breakdown::{CostBreakdownData, CostLine, CostRange};
pub use loan_summary::LoanSummaryData;
pub use next_questions::{FollowUpQuestion, NextQuestionsData};
pub use risk_flags::{RiskFlag, RiskFlagsData};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    Draft,
    NeedsInfo,
    Ready,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    LoanSummary,
    CostBreakdown,
    RiskFlags,
    NextQuestions,
    LoanSuggestion,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArtifactData {
    LoanSummary(LoanSummaryData),
    CostBreakdown(CostBreakdownData),
    RiskFlags(RiskFlagsData),
    NextQuestions(NextQuestionsData),
    LoanSuggestion(LoanSuggestionResult),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    pub kind: ArtifactKind,
    pub title: String,
    pub version: u32,
    pub data: ArtifactData,
}

impl Artifact {
    fn new(kind: ArtifactKind, data: ArtifactData) -> Self {
        let (id, title) = match kind {
            ArtifactKind::LoanSummary => ("loan-summary", "Loan summary"),
            ArtifactKind::CostBreakdown => ("cost-breakdown", "Estimated production costs"),
            ArtifactKind::RiskFlags => ("risk-flags", "Risk flags"),
            ArtifactKind::NextQuestions => ("next-questions", "Suggested follow-up questions"),
            ArtifactKind::LoanSuggestion => ("loan-suggestion", "Suggested loan amount"),
        };
        Self { id: id.to_owned(), kind, title: title.to_owned(), version: 1, data }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtifactBundle {
    pub readiness: Readiness,
    pub missing: Vec<String>,
    pub artifacts: Vec<Artifact>,
}

pub struct ArtifactInput<'a> {
    pub slots: &'a SlotValues,
    pub recent_messages: &'a [Message],
    pub missing_required: &'a [String],
    pub audience: Audience,
    pub dialect: Dialect,
}

/// Round to the nearest multiple of `increment`, half away from zero.
pub fn round_to_increment(amount: Decimal, increment: Decimal) -> Decimal {
    if increment <= Decimal::ZERO {
        return amount;
    }
    (amount / increment).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        * increment
}

/// First present value among candidate slot keys, as text.
pub(crate) fn lookup_text(slots: &SlotValues, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| slots.get(*key))
        .filter(|value| is_present(Some(*value)))
        .find_map(|value| match value {
            serde_json::Value::String(text) => Some(text.trim().to_owned()),
            other => Some(other.to_string()),
        })
}

/// First present value among candidate slot keys, coerced to a Decimal.
pub(crate) fn lookup_decimal(slots: &SlotValues, keys: &[&str]) -> Option<Decimal> {
    use rust_decimal::prelude::FromPrimitive;
    keys.iter()
        .filter_map(|key| slots.get(*key))
        .find_map(numeric)
        .and_then(Decimal::from_f64)
}

/// The three fields MVP underwriting cannot proceed without.
fn mandatory_missing(summary: &LoanSummaryData) -> Vec<String> {
    let mut missing = Vec::new();
    if summary.crop.is_none() {
        missing.push("crop".to_owned());
    }
    if !summary.hectares.is_some_and(|hectares| hectares > Decimal::ZERO) {
        missing.push("hectares".to_owned());
    }
    if summary.province.is_none() && summary.municipality.is_none() {
        missing.push("province_or_municipality".to_owned());
    }
    missing
}

/// Assemble the full bundle: the four builders, the authoritative missing
/// list, the readiness verdict, and (when policy allows) a loan suggestion.
pub fn build_artifacts(input: &ArtifactInput<'_>, policy: &LoanPolicy) -> ArtifactBundle {
    let summary = loan_summary::build(input.slots, input.recent_messages);
    let breakdown = cost_breakdown::build(&summary);
    let risks = risk_flags::build(input.slots, &summary);

    let missing = mandatory_missing(&summary);
    let readiness = match missing.len() {
        0 => Readiness::Ready,
        1 => Readiness::Draft,
        _ => Readiness::NeedsInfo,
    };

    // The flow's own missing-required list drives follow-up questions when a
    // flow is attached; underwriting gaps drive them in unguided mode.
    let question_fields: &[String] =
        if input.missing_required.is_empty() { &missing } else { input.missing_required };
    let questions = next_questions::build(question_fields, input.audience, input.dialect);

    let mut artifacts = vec![
        Artifact::new(ArtifactKind::LoanSummary, ArtifactData::LoanSummary(summary.clone())),
        Artifact::new(ArtifactKind::CostBreakdown, ArtifactData::CostBreakdown(breakdown.clone())),
        Artifact::new(ArtifactKind::RiskFlags, ArtifactData::RiskFlags(risks.clone())),
        Artifact::new(ArtifactKind::NextQuestions, ArtifactData::NextQuestions(questions)),
    ];

    if policy.enabled && policy.visibility != SuggestionVisibility::Off {
        let suggestion_input = SuggestionInput {
            summary: &summary,
            breakdown: Some(&breakdown),
            risk_flags: &risks.flags,
            missing_fields: &missing,
        };
        if let Some(suggestion) = compute_loan_suggestion(&suggestion_input, policy) {
            artifacts
                .push(Artifact::new(ArtifactKind::LoanSuggestion, ArtifactData::LoanSuggestion(suggestion)));
        }
    }

    ArtifactBundle { readiness, missing, artifacts }
}
