//! External fix-tool invocation.
//!
//! The tool is an aider-compatible command-line program. It is run once per
//! pipeline run inside the cloned repository with a prompt file and a list of
//! target files, and its standard output is parsed into a [`Changeset`].

mod config;
mod error;
mod output;
mod prompt;
mod targets;

pub use config::{ToolConfig, API_KEY_ENV};
pub use error::InvocationError;
pub use output::{extract_solution, parse_tool_output};
pub use prompt::build_prompt;
pub use targets::{select_target_files, FALLBACK_TARGETS, MAX_GLOB_TARGETS};

use crate::analysis::AnalysisResult;
use crate::changeset::Changeset;
use crate::config::{RepoConfig, Secret};
use crate::issues::IssueDetails;
use std::io::Write as _;
use std::path::Path;
use std::process::Stdio;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, info, info_span, warn, Instrument};

/// Amount of tool stderr kept for error reports, counted from the end.
pub const STDERR_TAIL_BYTES: usize = 4096;

/// Runs the fix tool for an issue and parses its edits.
///
/// # Arguments
///
/// * `issue` - Issue being fixed
/// * `analysis` - Analyzer output for the issue body
/// * `work_dir` - Root of the cloned repository
/// * `repo_config` - Repository policy (file include/exclude patterns)
/// * `tool` - How to run the tool
///
/// # Returns
///
/// The parsed [`Changeset`]. An empty changeset means the tool ran
/// successfully but reported no edits.
///
/// # Errors
///
/// Returns [`InvocationError`] if no target files resolve, the prompt file
/// cannot be written, or the tool fails to start, exits unsuccessfully or
/// exceeds its deadline.
pub async fn invoke(
    issue: &IssueDetails,
    analysis: &AnalysisResult,
    work_dir: &Path,
    repo_config: &RepoConfig,
    tool: &ToolConfig,
) -> Result<Changeset, InvocationError> {
    let span = info_span!(
        "invoke_fix_tool",
        issue_number = issue.number,
        binary = %tool.binary
    );

    async {
        let targets = select_target_files(work_dir, &analysis.file_paths, &repo_config.files)?;
        info!(count = targets.len(), "Selected target files");

        let prompt = build_prompt(issue, analysis);
        let prompt_file = write_prompt_file(&prompt)?;

        let stdout = run_tool(tool, work_dir, prompt_file.path(), &targets).await?;
        drop(prompt_file);

        let changeset = parse_tool_output(&stdout);
        if changeset.is_empty() {
            warn!("Fix tool reported no edits");
        } else {
            info!(files = changeset.len(), "Fix tool produced edits");
        }
        Ok(changeset)
    }
    .instrument(span)
    .await
}

/// Writes the prompt to a temporary file that is removed when dropped.
fn write_prompt_file(prompt: &str) -> Result<NamedTempFile, InvocationError> {
    let mut file = tempfile::Builder::new()
        .prefix("issue-autofix-prompt-")
        .suffix(".md")
        .tempfile()
        .map_err(InvocationError::PromptFile)?;
    file.write_all(prompt.as_bytes())
        .and_then(|()| file.flush())
        .map_err(InvocationError::PromptFile)?;
    Ok(file)
}

/// Spawns the tool and waits for it within the configured deadline.
///
/// The child is killed if the deadline fires or the calling future is
/// dropped.
async fn run_tool(
    tool: &ToolConfig,
    work_dir: &Path,
    prompt_path: &Path,
    targets: &[String],
) -> Result<String, InvocationError> {
    let mut command = Command::new(&tool.binary);
    command.arg("--model").arg(&tool.model);
    if let Some(key) = &tool.api_key {
        command
            .arg("--openai-api-key")
            .arg(key.expose())
            .env(API_KEY_ENV, key.expose());
    }
    command
        .args(["--yes", "--no-git", "--message-file"])
        .arg(prompt_path)
        .args(targets)
        .current_dir(work_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(model = %tool.model, targets = targets.len(), "Starting fix tool");
    let child = command.spawn().map_err(InvocationError::Spawn)?;

    let output = match tokio::time::timeout(tool.timeout(), child.wait_with_output()).await {
        Ok(result) => result.map_err(InvocationError::Spawn)?,
        Err(_) => {
            warn!(timeout_secs = tool.timeout_secs, "Fix tool timed out");
            return Err(InvocationError::Timeout {
                timeout_secs: tool.timeout_secs,
            });
        }
    };

    if !output.status.success() {
        return Err(InvocationError::Failed {
            code: output.status.code(),
            stderr: stderr_excerpt(&output.stderr, tool.api_key.as_ref()),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Redacts the API key from tool stderr and keeps its last
/// [`STDERR_TAIL_BYTES`], since it ends up in a public issue comment.
fn stderr_excerpt(raw: &[u8], api_key: Option<&Secret>) -> String {
    let mut text = String::from_utf8_lossy(raw).trim().to_string();
    if let Some(key) = api_key.filter(|key| !key.is_blank()) {
        text = text.replace(key.expose(), "****");
    }
    if text.len() <= STDERR_TAIL_BYTES {
        return text;
    }

    let mut start = text.len() - STDERR_TAIL_BYTES;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &text[start..])
}
