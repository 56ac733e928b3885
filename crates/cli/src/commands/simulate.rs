//! Offline conversation simulator for flow authors.
//!
//! Runs the full orchestrator pipeline (extraction, merge, progress,
//! navigation, persistence into an in-memory store) with the language
//! backend disabled, so every turn shows the deterministic side of the
//! engine: what was captured, what is still missing, and what would be
//! asked next.

use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

use anihan_agent::llm::OfflineBackend;
use anihan_agent::orchestrator::{EngineSettings, Orchestrator, TurnRequest};
use anihan_core::audit::NoopAuditSink;
use anihan_core::domain::conversation::ConversationId;
use anihan_core::flow::definition::FlowDefinition;
use anihan_core::flow::registry::FlowRegistry;
use anihan_core::lang::Dialect;
use anihan_db::store::InMemoryConversationStore;

use super::CommandResult;

pub async fn run(flow_path: &Path, dialect: Dialect) -> CommandResult {
    let raw = match std::fs::read_to_string(flow_path) {
        Ok(raw) => raw,
        Err(error) => {
            return CommandResult::failed(format!("cannot read {}: {error}", flow_path.display()))
        }
    };
    let flow = match FlowDefinition::from_json(&raw) {
        Ok(flow) => flow,
        Err(error) => return CommandResult::failed(format!("invalid flow document: {error}")),
    };

    let issues = flow.validate();
    if !issues.is_empty() {
        let formatted: Vec<String> = issues.iter().map(ToString::to_string).collect();
        return CommandResult::failed(format!(
            "flow fails strict validation:\n- {}",
            formatted.join("\n- ")
        ));
    }

    let audience = flow.audience;
    let flow_id = flow.id.clone();
    let intro = flow.intro.title.clone();

    let registry = Arc::new(FlowRegistry::new(""));
    registry.insert(flow);
    let orchestrator = Orchestrator::new(
        Arc::new(InMemoryConversationStore::default()),
        Arc::new(OfflineBackend),
        registry,
        Arc::new(NoopAuditSink),
        EngineSettings { default_dialect: dialect, ..Default::default() },
    );

    let conversation_id = ConversationId::new("simulated");
    let mut lines = vec![format!("simulating `{intro}` ({flow_id}); one user turn per line")];

    let stdin = std::io::stdin();
    for input in stdin.lock().lines() {
        let input = match input {
            Ok(line) => line,
            Err(error) => return CommandResult::failed(format!("stdin error: {error}")),
        };
        if input.trim().is_empty() {
            continue;
        }

        let outcome = match orchestrator
            .handle_message(TurnRequest {
                conversation_id: conversation_id.clone(),
                audience,
                flow_id: flow_id.clone(),
                text: input.clone(),
                dialect: Some(dialect),
                correlation_id: "simulate".to_owned(),
            })
            .await
        {
            Ok(outcome) => outcome,
            Err(error) => return CommandResult::failed(format!("turn failed: {error}")),
        };

        lines.push(format!("> {input}"));
        if let Some(progress) = &outcome.progress {
            lines.push(format!(
                "  progress {}% ({}/{} required), missing: [{}]",
                progress.percent,
                progress.required_filled,
                progress.required_total,
                progress.missing_required.join(", ")
            ));
        }
        match &outcome.next_prompt {
            Some(prompt) => lines.push(format!("  next: {prompt}")),
            None => lines.push("  flow complete".to_owned()),
        }
    }

    match orchestrator
        .artifact_bundle(&conversation_id, audience, Some(dialect), "simulate")
        .await
    {
        Ok(bundle) => match serde_json::to_string_pretty(&bundle) {
            Ok(rendered) => lines.push(format!("artifact bundle:\n{rendered}")),
            Err(error) => return CommandResult::failed(format!("cannot render bundle: {error}")),
        },
        Err(error) => return CommandResult::failed(format!("cannot build bundle: {error}")),
    }

    CommandResult::ok(lines.join("\n"))
}
