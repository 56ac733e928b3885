//! Deterministic loan amount suggestion.
//!
//! Five stages, each leaving one adjustment record behind: pick a base
//! amount, scale it for risk, penalize missing information, clamp to policy
//! bounds, round to the policy increment. The LLM is never involved; this
//! number comes from arithmetic that can be replayed from the trail.

use rust_decimal::Decimal;

use crate::artifacts::{round_to_increment, Confidence, Severity};
use crate::benchmarks;
use crate::policy::LoanPolicy;
use crate::suggestion::{Adjustment, LoanSuggestionResult, SuggestionInput};

/// Conservative fallback when area is known but the crop has no benchmark.
const FLAT_RATE_PER_HA: i64 = 40_000;

/// Fields whose absence carries a penalty, matched by substring.
const CRITICAL_FIELDS: &[&str] = &["crop", "hectare", "province"];

const PENALTY_PER_FIELD_PCT: i64 = 10;
const PENALTY_CAP_PCT: i64 = 25;

pub fn compute_loan_suggestion(
    input: &SuggestionInput<'_>,
    policy: &LoanPolicy,
) -> Option<LoanSuggestionResult> {
    if !policy.enabled {
        return None;
    }

    let mut adjustments: Vec<Adjustment> = Vec::new();
    let mut disclaimers: Vec<String> = Vec::new();

    // Stage 1: base amount, best evidence first.
    let hectares = input.summary.hectares.filter(|hectares| *hectares > Decimal::ZERO);
    let benchmark = input.summary.crop.as_deref().and_then(benchmarks::find);
    let breakdown_total = input
        .breakdown
        .and_then(|breakdown| breakdown.total)
        .filter(|total| total.midpoint() > Decimal::ZERO);

    let (base_amount, mut confidence) = if let Some(total) = breakdown_total {
        adjustments.push(base_adjustment(format!(
            "Base amount from estimated production costs ({} to {})",
            total.min, total.max
        )));
        disclaimers
            .push("The base amount reflects estimated production costs for the crop.".to_owned());
        (total.midpoint(), Confidence::High)
    } else if let (Some(hectares), Some(benchmark)) = (hectares, benchmark) {
        adjustments.push(base_adjustment(format!(
            "Base amount from the {} benchmark at {} per hectare",
            benchmark.crop,
            benchmark.avg()
        )));
        disclaimers.push("The base amount uses a provincial crop cost benchmark.".to_owned());
        (hectares * benchmark.avg(), Confidence::Medium)
    } else if let Some(hectares) = hectares {
        adjustments.push(base_adjustment(format!(
            "Base amount from a flat rate of {FLAT_RATE_PER_HA} per hectare (no crop benchmark)"
        )));
        disclaimers
            .push("No cost benchmark matched the crop; a conservative flat rate was used.".to_owned());
        (hectares * Decimal::from(FLAT_RATE_PER_HA), Confidence::Low)
    } else {
        adjustments.push(base_adjustment(
            "Base amount set to the policy minimum (farm size unknown)".to_owned(),
        ));
        disclaimers
            .push("Farm size is unknown, so the suggestion starts at the policy minimum.".to_owned());
        (policy.min_loan_amount, Confidence::Low)
    };

    let mut amount = base_amount;

    // Stage 2: risk multiplier. High-severity flags dominate medium ones.
    let high_count = count_severity(input, Severity::High);
    let medium_count = count_severity(input, Severity::Medium);
    if high_count > 0 {
        let multiplier = (Decimal::ONE
            - Decimal::new(15, 2) * Decimal::from(high_count))
        .max(Decimal::new(70, 2));
        let after = amount * multiplier;
        adjustments.push(Adjustment {
            reason: format!("Risk reduction for {high_count} high-severity risk flag(s)"),
            multiplier: Some(multiplier),
            penalty: None,
            impact: after - amount,
        });
        disclaimers.push("High-severity risk factors reduced the suggested amount.".to_owned());
        amount = after;
        confidence = Confidence::Low;
    } else if medium_count > 0 {
        let multiplier = (Decimal::ONE
            - Decimal::new(8, 2) * Decimal::from(medium_count))
        .max(Decimal::new(80, 2));
        let after = amount * multiplier;
        adjustments.push(Adjustment {
            reason: format!("Risk reduction for {medium_count} medium-severity risk flag(s)"),
            multiplier: Some(multiplier),
            penalty: None,
            impact: after - amount,
        });
        disclaimers.push("Moderate risk factors reduced the suggested amount.".to_owned());
        amount = after;
    }

    // Stage 3: missing-information penalty, 10% per critical field, capped.
    let missing_hits: Vec<&str> = CRITICAL_FIELDS
        .iter()
        .copied()
        .filter(|field| {
            input.missing_fields.iter().any(|missing| missing.to_lowercase().contains(field))
        })
        .collect();
    if !missing_hits.is_empty() {
        let penalty_pct = (Decimal::new(PENALTY_PER_FIELD_PCT, 2)
            * Decimal::from(missing_hits.len() as i64))
        .min(Decimal::new(PENALTY_CAP_PCT, 2));
        let after = amount - amount * penalty_pct;
        adjustments.push(Adjustment {
            reason: format!("Missing information penalty ({})", missing_hits.join(", ")),
            multiplier: None,
            penalty: Some(penalty_pct),
            impact: after - amount,
        });
        disclaimers.push(format!(
            "Reduced because key information is still missing: {}.",
            missing_hits.join(", ")
        ));
        amount = after;
        confidence = Confidence::Low;
    }

    // Stage 4: policy clamp, recorded only when it fires.
    if amount < policy.min_loan_amount {
        adjustments.push(Adjustment {
            reason: "Policy minimum applied".to_owned(),
            multiplier: None,
            penalty: None,
            impact: policy.min_loan_amount - amount,
        });
        disclaimers.push("The amount was raised to the lending policy minimum.".to_owned());
        amount = policy.min_loan_amount;
    } else if amount > policy.max_loan_amount {
        adjustments.push(Adjustment {
            reason: "Policy maximum applied".to_owned(),
            multiplier: None,
            penalty: None,
            impact: policy.max_loan_amount - amount,
        });
        disclaimers.push("The amount was capped at the lending policy maximum.".to_owned());
        amount = policy.max_loan_amount;
    }

    // Stage 5: rounding to the policy increment.
    let rounded = round_to_increment(amount, policy.rounding_increment);
    if rounded != amount {
        adjustments.push(Adjustment {
            reason: format!("Rounded to the nearest {}", policy.rounding_increment),
            multiplier: None,
            penalty: None,
            impact: rounded - amount,
        });
        amount = rounded;
    }

    disclaimers.push(
        "This is a system-generated estimate subject to review by a loan officer. \
         It is not a credit decision."
            .to_owned(),
    );

    Some(LoanSuggestionResult {
        suggested_amount: amount,
        base_amount,
        adjustments,
        disclaimers,
        confidence,
    })
}

fn base_adjustment(reason: String) -> Adjustment {
    Adjustment { reason, multiplier: None, penalty: None, impact: Decimal::ZERO }
}

fn count_severity(input: &SuggestionInput<'_>, severity: Severity) -> u32 {
    input.risk_flags.iter().filter(|flag| flag.severity == severity).count() as u32
}
