//! The slot-filling state machine: which step to present next.
//!
//! States are the flow's step ids plus the implicit terminal "no next step".
//! Navigation scans steps in declaration order and presents the first step
//! that still has an unfilled slot; a fully-answered step's transition may
//! jump the scan to its target. This deliberately preserves the source
//! semantic of "first underspecified step in declaration order" rather than
//! "resume after the last answered step".

use serde_json::Value;
use thiserror::Error;

use crate::flow::definition::{Condition, ConditionOp, FlowDefinition, Step, StepNext};
use crate::flow::state::{is_present, numeric, SlotValues};

/// Lenient is the production runtime behavior: a transition to a step id
/// that does not exist is absorbed by presenting the current step again.
/// Strict is for authoring tools, which want that surfaced as an error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NavigationMode {
    #[default]
    Lenient,
    Strict,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("step `{step_id}` transitions to unknown step `{target}`")]
    DanglingStepRef { step_id: String, target: String },
}

fn step_satisfied(step: &Step, slots: &SlotValues) -> bool {
    step.slot_keys.iter().all(|key| is_present(slots.get(key)))
}

/// Evaluate one condition against current slot state. Pure predicate; any
/// type mismatch (non-numeric operand for gt/lt, non-array for in) is false.
pub fn check_condition(condition: &Condition, slots: &SlotValues) -> bool {
    let slot_value = slots.get(&condition.slot_key);

    match condition.op {
        ConditionOp::Exists => is_present(slot_value),
        ConditionOp::Missing => !is_present(slot_value),
        ConditionOp::Equals => match (slot_value, &condition.value) {
            (Some(actual), Some(expected)) => actual == expected,
            _ => false,
        },
        ConditionOp::NotEquals => match (slot_value, &condition.value) {
            (Some(actual), Some(expected)) => actual != expected,
            _ => true,
        },
        ConditionOp::Gt => match (slot_value.and_then(numeric), condition.value.as_ref().and_then(numeric)) {
            (Some(actual), Some(threshold)) => actual > threshold,
            _ => false,
        },
        ConditionOp::Lt => match (slot_value.and_then(numeric), condition.value.as_ref().and_then(numeric)) {
            (Some(actual), Some(threshold)) => actual < threshold,
            _ => false,
        },
        ConditionOp::In => match (slot_value, &condition.value) {
            (Some(actual), Some(Value::Array(allowed))) => allowed.contains(actual),
            _ => false,
        },
    }
}

/// Returns the step to present, or `None` when the flow is complete.
pub fn next_step<'a>(
    flow: &'a FlowDefinition,
    slots: &SlotValues,
    mode: NavigationMode,
) -> Result<Option<&'a Step>, NavigationError> {
    for step in &flow.steps {
        if !step_satisfied(step, slots) {
            return Ok(Some(step));
        }

        let Some(next) = &step.next else {
            continue;
        };
        let target_id = match next {
            StepNext::Step(id) => Some(id.as_str()),
            StepNext::Conditional(conditional) => {
                if conditional.when.iter().all(|condition| check_condition(condition, slots)) {
                    Some(conditional.go.as_str())
                } else {
                    conditional.else_go.as_deref()
                }
            }
        };
        let Some(target_id) = target_id else {
            continue;
        };

        match flow.step(target_id) {
            Some(target) if !step_satisfied(target, slots) => return Ok(Some(target)),
            Some(_) => {}
            None => match mode {
                NavigationMode::Strict => {
                    return Err(NavigationError::DanglingStepRef {
                        step_id: step.id.clone(),
                        target: target_id.to_owned(),
                    });
                }
                NavigationMode::Lenient => return Ok(Some(step)),
            },
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::flow::definition::fixtures::{flow, slot, step};
    use crate::flow::definition::{
        Condition, ConditionOp, ConditionalNext, SlotType, StepNext,
    };
    use crate::flow::navigator::{check_condition, next_step, NavigationError, NavigationMode};
    use crate::flow::state::SlotValues;

    fn slots(pairs: &[(&str, serde_json::Value)]) -> SlotValues {
        pairs.iter().map(|(key, value)| ((*key).to_owned(), value.clone())).collect()
    }

    fn condition(slot_key: &str, op: ConditionOp, value: Option<serde_json::Value>) -> Condition {
        Condition { slot_key: slot_key.to_owned(), op, value }
    }

    fn intake_flow() -> crate::flow::definition::FlowDefinition {
        flow(
            vec![
                slot("crop", SlotType::Select, true),
                slot("hectares", SlotType::Number, true),
                slot("irrigation", SlotType::Text, false),
            ],
            vec![
                step("ask-crop", &["crop"]),
                step("ask-size", &["hectares"]),
                step("ask-irrigation", &["irrigation"]),
            ],
        )
    }

    #[test]
    fn presents_first_underspecified_step_in_declaration_order() {
        let definition = intake_flow();

        let first = next_step(&definition, &SlotValues::new(), NavigationMode::Lenient)
            .expect("lenient navigation never errors");
        assert_eq!(first.map(|step| step.id.as_str()), Some("ask-crop"));

        let after_crop = next_step(
            &definition,
            &slots(&[("crop", json!("rice"))]),
            NavigationMode::Lenient,
        )
        .expect("lenient navigation never errors");
        assert_eq!(after_crop.map(|step| step.id.as_str()), Some("ask-size"));
    }

    #[test]
    fn earlier_step_is_revisited_even_after_later_answers() {
        // hectares answered out of order: the earlier crop step still wins.
        let definition = intake_flow();
        let state = slots(&[("hectares", json!(3.0))]);

        let presented = next_step(&definition, &state, NavigationMode::Lenient)
            .expect("lenient navigation never errors");
        assert_eq!(presented.map(|step| step.id.as_str()), Some("ask-crop"));
    }

    #[test]
    fn flow_completes_when_every_step_is_satisfied() {
        let definition = intake_flow();
        let state = slots(&[
            ("crop", json!("rice")),
            ("hectares", json!(3.0)),
            ("irrigation", json!("irrigated")),
        ]);

        let presented = next_step(&definition, &state, NavigationMode::Lenient)
            .expect("lenient navigation never errors");
        assert!(presented.is_none());
    }

    #[test]
    fn conditional_next_jumps_when_all_conditions_hold() {
        let mut definition = flow(
            vec![
                slot("crop", SlotType::Select, true),
                slot("hectares", SlotType::Number, true),
                slot("irrigation", SlotType::Text, false),
            ],
            vec![
                step("ask-crop", &["crop"]),
                step("ask-size", &["hectares"]),
                step("ask-irrigation", &["irrigation"]),
            ],
        );
        definition.steps[0].next = Some(StepNext::Conditional(ConditionalNext {
            when: vec![condition("crop", ConditionOp::Equals, Some(json!("rice")))],
            go: "ask-irrigation".to_owned(),
            else_go: None,
        }));

        let state = slots(&[("crop", json!("rice"))]);
        let presented = next_step(&definition, &state, NavigationMode::Lenient)
            .expect("lenient navigation never errors");
        assert_eq!(presented.map(|step| step.id.as_str()), Some("ask-irrigation"));
    }

    #[test]
    fn conditional_else_branch_is_taken_when_conditions_fail() {
        let mut definition = intake_flow();
        definition.steps[0].next = Some(StepNext::Conditional(ConditionalNext {
            when: vec![condition("crop", ConditionOp::Equals, Some(json!("rice")))],
            go: "ask-irrigation".to_owned(),
            else_go: Some("ask-size".to_owned()),
        }));

        let state = slots(&[("crop", json!("corn"))]);
        let presented = next_step(&definition, &state, NavigationMode::Lenient)
            .expect("lenient navigation never errors");
        assert_eq!(presented.map(|step| step.id.as_str()), Some("ask-size"));
    }

    #[test]
    fn dangling_reference_falls_through_to_current_step_in_lenient_mode() {
        let mut definition = intake_flow();
        definition.steps[0].next = Some(StepNext::Step("retired-step".to_owned()));
        let state = slots(&[("crop", json!("rice"))]);

        let presented = next_step(&definition, &state, NavigationMode::Lenient)
            .expect("lenient navigation never errors");
        assert_eq!(presented.map(|step| step.id.as_str()), Some("ask-crop"));
    }

    #[test]
    fn dangling_reference_is_an_error_in_strict_mode() {
        let mut definition = intake_flow();
        definition.steps[0].next = Some(StepNext::Step("retired-step".to_owned()));
        let state = slots(&[("crop", json!("rice"))]);

        let error = next_step(&definition, &state, NavigationMode::Strict)
            .expect_err("strict mode surfaces dangling refs");
        assert_eq!(
            error,
            NavigationError::DanglingStepRef {
                step_id: "ask-crop".to_owned(),
                target: "retired-step".to_owned(),
            }
        );
    }

    #[test]
    fn condition_operators_cover_presence_comparison_and_membership() {
        let state = slots(&[("hectares", json!(3.5)), ("crop", json!("rice")), ("blank", json!(""))]);

        assert!(check_condition(&condition("crop", ConditionOp::Exists, None), &state));
        assert!(!check_condition(&condition("blank", ConditionOp::Exists, None), &state));
        assert!(check_condition(&condition("blank", ConditionOp::Missing, None), &state));
        assert!(check_condition(
            &condition("crop", ConditionOp::Equals, Some(json!("rice"))),
            &state
        ));
        assert!(check_condition(
            &condition("crop", ConditionOp::NotEquals, Some(json!("corn"))),
            &state
        ));
        assert!(check_condition(&condition("hectares", ConditionOp::Gt, Some(json!(2))), &state));
        assert!(check_condition(&condition("hectares", ConditionOp::Lt, Some(json!(10))), &state));
        assert!(!check_condition(&condition("crop", ConditionOp::Gt, Some(json!(2))), &state));
        assert!(check_condition(
            &condition("crop", ConditionOp::In, Some(json!(["rice", "corn"]))),
            &state
        ));
        assert!(!check_condition(
            &condition("crop", ConditionOp::In, Some(json!("rice"))),
            &state
        ));
    }

    #[test]
    fn numeric_comparison_coerces_string_slot_values() {
        let state = slots(&[("hectares", json!("3.5"))]);
        assert!(check_condition(&condition("hectares", ConditionOp::Gt, Some(json!(2))), &state));
    }
}
