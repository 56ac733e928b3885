use serde::{Deserialize, Serialize};

use crate::flow::definition::FlowDefinition;
use crate::flow::state::{is_present, SlotValues};

/// Derived completion view. Recomputed every turn, never stored on its own;
/// snapshots embed a copy purely for audit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub required_total: u32,
    pub required_filled: u32,
    pub percent: u8,
    pub missing_required: Vec<String>,
}

pub fn compute_progress(flow: &FlowDefinition, slots: &SlotValues) -> Progress {
    let mut required_total = 0u32;
    let mut required_filled = 0u32;
    let mut missing_required = Vec::new();

    for slot in &flow.slots {
        if !slot.required {
            continue;
        }
        required_total += 1;
        if is_present(slots.get(&slot.key)) {
            required_filled += 1;
        } else {
            missing_required.push(slot.key.clone());
        }
    }

    let percent = if required_total == 0 {
        100
    } else {
        ((100.0 * f64::from(required_filled)) / f64::from(required_total)).round() as u8
    };

    Progress { required_total, required_filled, percent, missing_required }
}
