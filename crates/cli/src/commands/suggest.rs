//! Derive the artifact bundle and loan suggestion for saved slot state.

use std::path::Path;

use serde::Deserialize;

use anihan_core::flow::definition::Audience;
use anihan_core::flow::state::SlotValues;
use anihan_core::lang::Dialect;
use anihan_core::policy;
use anihan_core::{build_artifacts, ArtifactInput};

use super::CommandResult;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SavedState {
    slots: SlotValues,
    #[serde(default)]
    missing_required: Vec<String>,
    #[serde(default)]
    dialect: Option<String>,
}

pub fn run(state_path: &Path, deployment: &str, audience: Audience) -> CommandResult {
    let raw = match std::fs::read_to_string(state_path) {
        Ok(raw) => raw,
        Err(error) => {
            return CommandResult::failed(format!("cannot read {}: {error}", state_path.display()))
        }
    };
    let state: SavedState = match serde_json::from_str(&raw) {
        Ok(state) => state,
        Err(error) => return CommandResult::failed(format!("invalid state file: {error}")),
    };

    let dialect =
        state.dialect.as_deref().and_then(Dialect::parse).unwrap_or_default();
    let loan_policy = policy::resolve(deployment);
    let bundle = build_artifacts(
        &ArtifactInput {
            slots: &state.slots,
            recent_messages: &[],
            missing_required: &state.missing_required,
            audience,
            dialect,
        },
        &loan_policy,
    );

    match serde_json::to_string_pretty(&bundle) {
        Ok(rendered) => CommandResult::ok(rendered),
        Err(error) => CommandResult::failed(format!("cannot render bundle: {error}")),
    }
}
