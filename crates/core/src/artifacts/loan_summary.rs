use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::artifacts::{lookup_decimal, lookup_text, Confidence};
use crate::benchmarks;
use crate::domain::conversation::{Message, Role};
use crate::flow::state::SlotValues;

const CROP_KEYS: &[&str] = &["crop", "crop_type", "main_crop", "pananim"];
const HECTARE_KEYS: &[&str] = &["hectares", "farm_size", "farm_size_ha", "area_ha", "lupa"];
const PROVINCE_KEYS: &[&str] = &["province", "probinsya"];
const MUNICIPALITY_KEYS: &[&str] = &["municipality", "bayan", "city"];

/// How many trailing user messages are scanned when no crop slot is filled.
const CROP_SCAN_WINDOW: usize = 5;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoanSummaryData {
    pub crop: Option<String>,
    pub hectares: Option<Decimal>,
    pub province: Option<String>,
    pub municipality: Option<String>,
    pub confidence: Confidence,
    pub assumptions: Vec<String>,
}

pub fn build(slots: &SlotValues, recent_messages: &[Message]) -> LoanSummaryData {
    let crop = lookup_text(slots, CROP_KEYS).or_else(|| scan_messages_for_crop(recent_messages));
    let hectares = lookup_decimal(slots, HECTARE_KEYS);
    let province = lookup_text(slots, PROVINCE_KEYS);
    let municipality = lookup_text(slots, MUNICIPALITY_KEYS);

    let confidence = if crop.is_some() && hectares.is_some() && province.is_some() {
        Confidence::High
    } else if crop.is_some() && hectares.is_some() {
        Confidence::Medium
    } else {
        Confidence::Low
    };

    let mut assumptions = Vec::new();
    if crop.is_none() {
        assumptions.push("Crop not yet stated; no benchmark can be applied.".to_owned());
    }
    if hectares.is_none() {
        assumptions.push("Farm size not yet stated; totals cannot be scaled.".to_owned());
    }
    if province.is_none() {
        assumptions.push("Province not yet stated; regional pricing is unknown.".to_owned());
    }
    if municipality.is_none() {
        assumptions.push("Municipality not yet stated.".to_owned());
    }

    LoanSummaryData { crop, hectares, province, municipality, confidence, assumptions }
}

fn scan_messages_for_crop(recent_messages: &[Message]) -> Option<String> {
    recent_messages
        .iter()
        .rev()
        .filter(|message| message.role == Role::User)
        .take(CROP_SCAN_WINDOW)
        .find_map(|message| benchmarks::match_in_text(&message.content))
        .map(|benchmark| benchmark.crop.to_owned())
}
