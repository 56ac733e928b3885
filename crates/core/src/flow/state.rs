//! Slot value state and the monotonic merge that grows it turn by turn.

use std::collections::BTreeMap;

use serde_json::Value;

/// Values captured so far for one conversation, keyed by slot key.
/// Owned by exactly one conversation; persisted as an opaque snapshot.
pub type SlotValues = BTreeMap<String, Value>;

/// A value counts as present when it is neither null nor an empty string.
pub fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(text)) => !text.trim().is_empty(),
        Some(_) => true,
    }
}

/// Coerce a slot value to a number. Strings are parsed after stripping
/// thousands separators, so "1,500" and 1500 behave the same downstream.
pub fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    }
}

/// Merge an extraction result into existing state. Monotonic: a key is only
/// overwritten by a present value, so a later, less informative turn can
/// never erase what an earlier turn established.
pub fn merge(existing: &SlotValues, incoming: &SlotValues) -> SlotValues {
    let mut merged = existing.clone();
    for (key, value) in incoming {
        if is_present(Some(value)) {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}
