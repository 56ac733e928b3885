use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::artifacts::{lookup_text, LoanSummaryData, Severity};
use crate::flow::state::{is_present, SlotValues};

const IRRIGATION_KEYS: &[&str] = &["irrigation", "water_source", "patubig"];
const RAINFED_MARKERS: &[&str] = &["rainfed", "rain-fed", "sahod-ulan", "sahod ulan"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskFlag {
    pub code: String,
    pub severity: Severity,
    pub description: String,
    pub mitigation: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskFlagsData {
    pub flags: Vec<RiskFlag>,
}

fn flag(code: &str, severity: Severity, description: &str, mitigation: &str) -> RiskFlag {
    RiskFlag {
        code: code.to_owned(),
        severity,
        description: description.to_owned(),
        mitigation: mitigation.to_owned(),
    }
}

/// Independent, unordered rule checks. No rule suppresses another; a small
/// rainfed farm with no stated location raises every applicable flag.
pub fn build(slots: &SlotValues, summary: &LoanSummaryData) -> RiskFlagsData {
    let mut flags = Vec::new();

    if let Some(irrigation) = lookup_text(slots, IRRIGATION_KEYS) {
        let normalized = irrigation.to_lowercase();
        if RAINFED_MARKERS.iter().any(|marker| normalized.contains(marker)) {
            flags.push(flag(
                "WEATHER_RISK",
                Severity::High,
                "The farm is rainfed, so yields depend directly on rainfall.",
                "Consider weather-index insurance and a drought-tolerant variety.",
            ));
        }
    }

    let has_labor_cost = slots
        .iter()
        .any(|(key, value)| key.contains("labor") && is_present(Some(value)));
    if summary.hectares.is_some_and(|hectares| hectares > Decimal::from(2)) && !has_labor_cost {
        flags.push(flag(
            "LABOR_RISK",
            Severity::Medium,
            "The farm is larger than 2 hectares but no labor cost has been stated.",
            "Ask for the expected labor spend per cropping before finalizing costs.",
        ));
    }

    if summary.province.is_none() && summary.municipality.is_none() {
        flags.push(flag(
            "LOCATION_RISK",
            Severity::Medium,
            "No province or municipality on record for the farm.",
            "Confirm the farm location to apply regional pricing and hazards.",
        ));
    }

    if summary.crop.is_none() {
        flags.push(flag(
            "AGRO_RISK",
            Severity::Medium,
            "The crop has not been identified.",
            "Identify the crop to benchmark costs and seasonality.",
        ));
    }

    if summary.hectares.is_some_and(|hectares| hectares < Decimal::new(5, 1)) {
        flags.push(flag(
            "SCALE_RISK",
            Severity::Low,
            "The farm is smaller than half a hectare.",
            "Expect limited absolute margins; size the loan conservatively.",
        ));
    }

    RiskFlagsData { flags }
}
