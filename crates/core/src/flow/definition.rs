//! Declarative flow documents: the slot schema plus the ordered, conditionally
//! branching steps that fill it. Immutable once parsed.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    LoanOfficer,
    Farmer,
}

impl Audience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoanOfficer => "loan_officer",
            Self::Farmer => "farmer",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "loan_officer" => Some(Self::LoanOfficer),
            "farmer" => Some(Self::Farmer),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotType {
    Select,
    Text,
    Number,
    Date,
    Boolean,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlotOption {
    pub value: String,
    pub label: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotValidation {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub pattern: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub slot_type: SlotType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<SlotOption>,
    #[serde(default)]
    pub validation: Option<SlotValidation>,
    #[serde(default)]
    pub save_to_profile: bool,
    #[serde(default)]
    pub profile_field: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub slot_key: String,
    pub op: ConditionOp,
    #[serde(default)]
    pub value: Option<Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionOp {
    Equals,
    NotEquals,
    Exists,
    Missing,
    Gt,
    Lt,
    In,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalNext {
    pub when: Vec<Condition>,
    pub go: String,
    #[serde(default)]
    pub else_go: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepNext {
    Step(String),
    Conditional(ConditionalNext),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: String,
    pub title: String,
    pub prompt: String,
    #[serde(default)]
    pub slot_keys: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub next: Option<StepNext>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowIntro {
    pub title: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowDefinition {
    pub id: String,
    pub version: u32,
    pub audience: Audience,
    #[serde(default)]
    pub dialects_supported: Vec<String>,
    pub intro: FlowIntro,
    pub slots: Vec<Slot>,
    pub steps: Vec<Step>,
    #[serde(default)]
    pub report_template: Option<Value>,
}

#[derive(Debug, Error)]
pub enum FlowParseError {
    #[error("flow document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// One referential-integrity problem found by the strict validator.
/// Runtime navigation never surfaces these; authoring tooling does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowIssue {
    DuplicateSlotKey { key: String },
    DuplicateStepId { id: String },
    UnknownSlotKey { step_id: String, key: String },
    UnknownStepRef { step_id: String, target: String },
    SelectWithoutOptions { key: String },
}

impl std::fmt::Display for FlowIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateSlotKey { key } => write!(f, "slot key `{key}` is declared twice"),
            Self::DuplicateStepId { id } => write!(f, "step id `{id}` is declared twice"),
            Self::UnknownSlotKey { step_id, key } => {
                write!(f, "step `{step_id}` references unknown slot `{key}`")
            }
            Self::UnknownStepRef { step_id, target } => {
                write!(f, "step `{step_id}` transitions to unknown step `{target}`")
            }
            Self::SelectWithoutOptions { key } => {
                write!(f, "select slot `{key}` declares no options")
            }
        }
    }
}

impl FlowDefinition {
    pub fn from_json(raw: &str) -> Result<Self, FlowParseError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn slot(&self, key: &str) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.key == key)
    }

    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|step| step.id == id)
    }

    /// Strict authoring checks. Runtime loading deliberately skips these:
    /// a published flow with a dangling reference still runs (leniently).
    pub fn validate(&self) -> Vec<FlowIssue> {
        let mut issues = Vec::new();

        let mut seen_slots = std::collections::BTreeSet::new();
        for slot in &self.slots {
            if !seen_slots.insert(slot.key.as_str()) {
                issues.push(FlowIssue::DuplicateSlotKey { key: slot.key.clone() });
            }
            if slot.slot_type == SlotType::Select && slot.options.is_empty() {
                issues.push(FlowIssue::SelectWithoutOptions { key: slot.key.clone() });
            }
        }

        let mut seen_steps = std::collections::BTreeSet::new();
        for step in &self.steps {
            if !seen_steps.insert(step.id.as_str()) {
                issues.push(FlowIssue::DuplicateStepId { id: step.id.clone() });
            }
        }

        for step in &self.steps {
            for key in &step.slot_keys {
                if self.slot(key).is_none() {
                    issues.push(FlowIssue::UnknownSlotKey {
                        step_id: step.id.clone(),
                        key: key.clone(),
                    });
                }
            }
            let targets: Vec<&String> = match &step.next {
                Some(StepNext::Step(id)) => vec![id],
                Some(StepNext::Conditional(conditional)) => {
                    let mut targets = vec![&conditional.go];
                    if let Some(else_go) = &conditional.else_go {
                        targets.push(else_go);
                    }
                    targets
                }
                None => Vec::new(),
            };
            for target in targets {
                if self.step(target).is_none() {
                    issues.push(FlowIssue::UnknownStepRef {
                        step_id: step.id.clone(),
                        target: target.clone(),
                    });
                }
            }
        }

        issues
    }
}
