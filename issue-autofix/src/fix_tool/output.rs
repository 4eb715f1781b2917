//! Parsing of the fix tool's standard output.

use crate::changeset::{Changeset, FileChange};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::{debug, warn};

static EDIT_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Edited '([^']+)':\s*$").unwrap());

static HUNK_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^@@ -\d+(?:,\d+)? \+\d+(?:,\d+)? @@").unwrap());

static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\A```[^\n]*\n(.*?)\n?```").unwrap());

static SOLUTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)(?:^|\n)(?:Solution|Changes|I made the following changes):(.*?)(?:\n\s*\n|\z)")
        .unwrap()
});

/// Parses tool output into a changeset.
///
/// Each `Edited '<path>':` line opens a section that runs until the next
/// marker or the end of output. A section containing a hunk header becomes a
/// [`FileChange::Patch`]; a section that opens with a fenced block becomes a
/// [`FileChange::Replace`] of that block's content. Other sections and unsafe
/// paths are skipped. If a path is edited more than once, the last section
/// wins.
pub fn parse_tool_output(output: &str) -> Changeset {
    let mut files = BTreeMap::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in output.lines() {
        if let Some(caps) = EDIT_MARKER.captures(line) {
            if let Some((path, body)) = current.take() {
                record_section(&mut files, path, &body);
            }
            current = Some((caps[1].to_string(), Vec::new()));
        } else if let Some((_, body)) = current.as_mut() {
            body.push(line);
        }
    }
    if let Some((path, body)) = current.take() {
        record_section(&mut files, path, &body);
    }

    Changeset::new(files, extract_solution(output))
}

fn record_section(files: &mut BTreeMap<String, FileChange>, path: String, body: &[&str]) {
    let Some(path) = normalize_path(&path) else {
        warn!(path = %path, "Skipping edit outside the repository");
        return;
    };

    let body = body.join("\n");
    let Some(change) = classify_section(&body) else {
        warn!(path = %path, "Skipping edit section without a diff or file body");
        return;
    };

    if files.insert(path.clone(), change).is_some() {
        debug!(path = %path, "File edited more than once, keeping the last edit");
    }
}

fn classify_section(body: &str) -> Option<FileChange> {
    if HUNK_HEADER.is_match(body) {
        return Some(FileChange::Patch(body.trim_matches('\n').to_string()));
    }

    let trimmed = body.trim();
    FENCED_BLOCK.captures(trimmed).and_then(|caps| {
        let content = caps.get(1)?.as_str();
        let mut content = content.to_string();
        if !content.is_empty() {
            content.push('\n');
        }
        Some(FileChange::Replace(content))
    })
}

/// Returns a clean repository-relative path, or `None` if it could escape the
/// repository.
pub(crate) fn normalize_path(path: &str) -> Option<String> {
    let path = path.trim().trim_start_matches("./");
    if path.is_empty()
        || path.starts_with('/')
        || path.contains('\\')
        || path.split('/').any(|segment| segment == ".." || segment.is_empty())
    {
        return None;
    }
    Some(path.to_string())
}

/// Extracts the narrative explaining the fix, or the whole output if there is
/// no recognised marker.
pub fn extract_solution(output: &str) -> String {
    SOLUTION
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|solution| !solution.is_empty())
        .unwrap_or_else(|| output.trim().to_string())
}
