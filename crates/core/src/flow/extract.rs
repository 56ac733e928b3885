//! Deterministic slot capture from free text.
//!
//! This is best-effort keyword, substring, and number matching, not language
//! understanding. A miss is silent: absence of a captured value is the signal
//! the navigator uses to keep asking. Each slot type's heuristic sits behind
//! a trait so a stronger extractor can be swapped in per type without
//! touching the merge or navigation contracts.

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::Value;

use crate::flow::definition::{FlowDefinition, Slot, SlotType};
use crate::flow::state::SlotValues;
use crate::lang::{AFFIRMATIVE_WORDS, NEGATIVE_WORDS};

const TEXT_CAPTURE_LIMIT: usize = 200;

pub trait SlotValueExtractor: Send + Sync {
    fn capture(&self, slot: &Slot, message: &str) -> Option<Value>;
}

#[derive(Clone)]
pub struct SlotExtractor {
    select: Arc<dyn SlotValueExtractor>,
    text: Arc<dyn SlotValueExtractor>,
    number: Arc<dyn SlotValueExtractor>,
    date: Arc<dyn SlotValueExtractor>,
    boolean: Arc<dyn SlotValueExtractor>,
}

impl Default for SlotExtractor {
    fn default() -> Self {
        Self {
            select: Arc::new(SelectHeuristic),
            text: Arc::new(LabelTextHeuristic),
            number: Arc::new(FirstNumberHeuristic),
            date: Arc::new(TokenDateHeuristic),
            boolean: Arc::new(KeywordBooleanHeuristic),
        }
    }
}

impl SlotExtractor {
    /// Replace the heuristic for one slot type.
    pub fn with_strategy(mut self, slot_type: SlotType, strategy: Arc<dyn SlotValueExtractor>) -> Self {
        match slot_type {
            SlotType::Select => self.select = strategy,
            SlotType::Text => self.text = strategy,
            SlotType::Number => self.number = strategy,
            SlotType::Date => self.date = strategy,
            SlotType::Boolean => self.boolean = strategy,
        }
        self
    }

    fn strategy_for(&self, slot_type: SlotType) -> &dyn SlotValueExtractor {
        match slot_type {
            SlotType::Select => self.select.as_ref(),
            SlotType::Text => self.text.as_ref(),
            SlotType::Number => self.number.as_ref(),
            SlotType::Date => self.date.as_ref(),
            SlotType::Boolean => self.boolean.as_ref(),
        }
    }

    /// Run every slot's heuristic once over the message. Deterministic and
    /// idempotent for identical input; already-captured keys are skipped so
    /// slot declaration order decides ties.
    pub fn extract(&self, flow: &FlowDefinition, message: &str) -> SlotValues {
        let mut captured = SlotValues::new();
        for slot in &flow.slots {
            if captured.contains_key(&slot.key) {
                continue;
            }
            if let Some(value) = self.strategy_for(slot.slot_type).capture(slot, message) {
                captured.insert(slot.key.clone(), value);
            }
        }
        captured
    }
}

fn normalize(text: &str) -> String {
    text.to_lowercase()
}

fn tokenize(text: &str) -> Vec<String> {
    let mut sanitized = String::with_capacity(text.len());
    for character in text.chars() {
        if character.is_alphanumeric() || matches!(character, '.' | ',' | '-' | '/') {
            sanitized.push(character);
        } else {
            sanitized.push(' ');
        }
    }
    sanitized.split_whitespace().map(|token| token.to_string()).collect()
}

/// `number`: the first token that parses as an integer or decimal, bounds
/// checked against the slot's validation range when one is declared.
pub struct FirstNumberHeuristic;

impl SlotValueExtractor for FirstNumberHeuristic {
    fn capture(&self, slot: &Slot, message: &str) -> Option<Value> {
        for token in tokenize(message) {
            let cleaned = token.replace(',', "");
            let cleaned = cleaned.trim_matches('.');
            let Ok(number) = cleaned.parse::<f64>() else {
                continue;
            };
            if let Some(validation) = &slot.validation {
                if validation.min.is_some_and(|min| number < min)
                    || validation.max.is_some_and(|max| number > max)
                {
                    continue;
                }
            }
            return serde_json::Number::from_f64(number).map(Value::Number);
        }
        None
    }
}

/// `select`: case-insensitive substring match against each option's label and
/// value, in declaration order; first match wins.
pub struct SelectHeuristic;

impl SlotValueExtractor for SelectHeuristic {
    fn capture(&self, slot: &Slot, message: &str) -> Option<Value> {
        let haystack = normalize(message);
        for option in &slot.options {
            if haystack.contains(&normalize(&option.label))
                || haystack.contains(&normalize(&option.value))
            {
                return Some(Value::String(option.value.clone()));
            }
        }
        None
    }
}

/// `text`: only fires when the slot's label appears literally; the trailing
/// text (up to 200 chars) is the value.
pub struct LabelTextHeuristic;

impl SlotValueExtractor for LabelTextHeuristic {
    fn capture(&self, slot: &Slot, message: &str) -> Option<Value> {
        let haystack = normalize(message);
        let label = normalize(&slot.label);
        if label.is_empty() {
            return None;
        }

        let position = haystack.find(&label)?;
        let tail_start = position + label.len();
        let tail = message.get(tail_start..)?;
        let tail = tail.trim_start_matches([':', '-', ' ', '\t']);
        let captured: String = tail.chars().take(TEXT_CAPTURE_LIMIT).collect();
        let captured = captured.trim().to_owned();
        if captured.is_empty() {
            None
        } else {
            Some(Value::String(captured))
        }
    }
}

/// `date`: the first token that parses under a small set of literal formats.
pub struct TokenDateHeuristic;

impl SlotValueExtractor for TokenDateHeuristic {
    fn capture(&self, _slot: &Slot, message: &str) -> Option<Value> {
        const FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y"];
        for token in tokenize(message) {
            let token = token.trim_matches(['.', ',']);
            for format in FORMATS {
                if let Ok(date) = NaiveDate::parse_from_str(token, format) {
                    return Some(Value::String(date.format("%Y-%m-%d").to_string()));
                }
            }
        }
        None
    }
}

/// `boolean`: fixed bilingual yes/no keyword sets, first token hit wins.
pub struct KeywordBooleanHeuristic;

impl SlotValueExtractor for KeywordBooleanHeuristic {
    fn capture(&self, _slot: &Slot, message: &str) -> Option<Value> {
        for token in tokenize(&normalize(message)) {
            let word = token.trim_matches(['.', ',', '-', '/']);
            if AFFIRMATIVE_WORDS.contains(&word) {
                return Some(Value::Bool(true));
            }
            if NEGATIVE_WORDS.contains(&word) {
                return Some(Value::Bool(false));
            }
        }
        None
    }
}
