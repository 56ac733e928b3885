//! Strict authoring checks over flow documents. This is where dangling step
//! references fail loudly; the production runtime absorbs them silently.

use std::path::{Path, PathBuf};

use anihan_core::flow::definition::FlowDefinition;

use super::CommandResult;

pub fn run(path: &Path) -> CommandResult {
    let files = match collect_flow_files(path) {
        Ok(files) => files,
        Err(message) => return CommandResult::failed(message),
    };
    if files.is_empty() {
        return CommandResult::failed(format!("no flow documents found under {}", path.display()));
    }

    let mut lines = Vec::new();
    let mut failures = 0usize;

    for file in &files {
        match validate_file(file) {
            Ok(()) => lines.push(format!("ok    {}", file.display())),
            Err(issues) => {
                failures += 1;
                lines.push(format!("FAIL  {}", file.display()));
                for issue in issues {
                    lines.push(format!("      - {issue}"));
                }
            }
        }
    }

    lines.push(format!("{} document(s) checked, {} failed", files.len(), failures));
    let output = lines.join("\n");
    if failures == 0 {
        CommandResult::ok(output)
    } else {
        CommandResult::failed(output)
    }
}

fn validate_file(path: &Path) -> Result<(), Vec<String>> {
    let raw = std::fs::read_to_string(path).map_err(|error| vec![format!("unreadable: {error}")])?;
    let flow =
        FlowDefinition::from_json(&raw).map_err(|error| vec![format!("parse error: {error}")])?;

    let issues = flow.validate();
    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues.iter().map(ToString::to_string).collect())
    }
}

fn collect_flow_files(path: &Path) -> Result<Vec<PathBuf>, String> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(format!("{} is neither a file nor a directory", path.display()));
    }

    let mut files = Vec::new();
    collect_json_files(path, &mut files, 0)?;
    files.sort();
    Ok(files)
}

fn collect_json_files(dir: &Path, files: &mut Vec<PathBuf>, depth: u8) -> Result<(), String> {
    // Flows live at most one audience directory deep.
    if depth > 1 {
        return Ok(());
    }
    let entries =
        std::fs::read_dir(dir).map_err(|error| format!("cannot read {}: {error}", dir.display()))?;
    for entry in entries {
        let entry = entry.map_err(|error| format!("cannot read {}: {error}", dir.display()))?;
        let path = entry.path();
        if path.is_dir() {
            collect_json_files(&path, files, depth + 1)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    Ok(())
}
