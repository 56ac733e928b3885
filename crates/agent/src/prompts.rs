//! System prompt assembly for the language backend.
//!
//! The prompt carries exactly three kinds of context: who is being spoken to
//! and in which dialect, what the engine already knows, and the one question
//! the navigator wants asked next. Everything decision-shaped stays out.

use anihan_core::flow::definition::{Audience, FlowDefinition, Step};
use anihan_core::flow::progress::Progress;
use anihan_core::flow::state::SlotValues;
use anihan_core::lang::{dialect_instruction, Dialect};

pub struct PromptContext<'a> {
    pub flow: Option<&'a FlowDefinition>,
    pub slots: &'a SlotValues,
    pub progress: Option<&'a Progress>,
    pub next_step: Option<&'a Step>,
    pub audience: Audience,
    pub dialect: Dialect,
}

pub fn build_system_prompt(context: &PromptContext<'_>) -> String {
    let mut sections: Vec<String> = Vec::new();

    let persona = match context.audience {
        Audience::LoanOfficer => {
            "You assist a loan officer gathering agricultural lending information. \
             Be precise and concise."
        }
        Audience::Farmer => {
            "You assist a farmer applying for a production loan. Be warm, simple, \
             and encouraging."
        }
    };
    sections.push(persona.to_owned());
    sections.push(dialect_instruction(context.dialect).to_owned());
    sections.push(
        "Never state or promise an approved loan amount. Amount suggestions come \
         only from the lending engine and are reviewed by a loan officer."
            .to_owned(),
    );

    if let Some(flow) = context.flow {
        sections.push(format!("Conversation goal: {}", flow.intro.description));
    }

    if !context.slots.is_empty() {
        let mut known: Vec<String> = context
            .slots
            .iter()
            .map(|(key, value)| format!("- {key}: {value}"))
            .collect();
        known.sort();
        sections.push(format!("What we know so far:\n{}", known.join("\n")));
    }

    if let Some(progress) = context.progress {
        if !progress.missing_required.is_empty() {
            sections.push(format!(
                "Still missing: {}",
                progress.missing_required.join(", ")
            ));
        }
    }

    match context.next_step {
        Some(step) => {
            let mut section = format!("Ask this next, in your own words: {}", step.prompt);
            if !step.suggestions.is_empty() {
                section.push_str(&format!(
                    "\nOffer these example answers: {}",
                    step.suggestions.join(", ")
                ));
            }
            sections.push(section);
        }
        None if context.flow.is_some() => {
            sections.push(
                "All needed information has been collected. Thank them and summarize \
                 what was recorded."
                    .to_owned(),
            );
        }
        None => {
            sections.push(
                "No guided flow is active. Answer helpfully and ask what they need."
                    .to_owned(),
            );
        }
    }

    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use anihan_core::flow::definition::{Audience, FlowDefinition, FlowIntro, Step};
    use anihan_core::flow::progress::Progress;
    use anihan_core::flow::state::SlotValues;
    use anihan_core::lang::Dialect;

    use super::{build_system_prompt, PromptContext};

    fn flow() -> FlowDefinition {
        FlowDefinition {
            id: "farm-intake".to_owned(),
            version: 1,
            audience: Audience::Farmer,
            dialects_supported: vec!["en".to_owned()],
            intro: FlowIntro {
                title: "Farm intake".to_owned(),
                description: "collect farm basics for a loan application".to_owned(),
            },
            slots: Vec::new(),
            steps: Vec::new(),
            report_template: None,
        }
    }

    fn step() -> Step {
        Step {
            id: "ask-size".to_owned(),
            title: "Farm size".to_owned(),
            prompt: "How many hectares do you farm?".to_owned(),
            slot_keys: vec!["hectares".to_owned()],
            suggestions: vec!["1".to_owned(), "2.5".to_owned()],
            next: None,
        }
    }

    #[test]
    fn prompt_carries_known_slots_missing_fields_and_next_question() {
        let mut slots = SlotValues::new();
        slots.insert("crop".to_owned(), json!("rice"));
        let progress = Progress {
            required_total: 2,
            required_filled: 1,
            percent: 50,
            missing_required: vec!["hectares".to_owned()],
        };
        let flow = flow();
        let step = step();

        let prompt = build_system_prompt(&PromptContext {
            flow: Some(&flow),
            slots: &slots,
            progress: Some(&progress),
            next_step: Some(&step),
            audience: Audience::Farmer,
            dialect: Dialect::Filipino,
        });

        assert!(prompt.contains("crop: \"rice\""));
        assert!(prompt.contains("Still missing: hectares"));
        assert!(prompt.contains("How many hectares do you farm?"));
        assert!(prompt.contains("1, 2.5"));
        assert!(prompt.contains("Tagalog"));
        assert!(prompt.contains("Never state or promise an approved loan amount"));
    }

    #[test]
    fn completed_flow_switches_to_a_summary_instruction() {
        let flow = flow();
        let prompt = build_system_prompt(&PromptContext {
            flow: Some(&flow),
            slots: &SlotValues::new(),
            progress: None,
            next_step: None,
            audience: Audience::LoanOfficer,
            dialect: Dialect::English,
        });
        assert!(prompt.contains("summarize"));
    }

    #[test]
    fn unguided_mode_gets_the_generic_instruction() {
        let prompt = build_system_prompt(&PromptContext {
            flow: None,
            slots: &SlotValues::new(),
            progress: None,
            next_step: None,
            audience: Audience::Farmer,
            dialect: Dialect::English,
        });
        assert!(prompt.contains("No guided flow is active"));
    }
}
