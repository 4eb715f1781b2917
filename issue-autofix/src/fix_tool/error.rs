//! Fix-tool invocation error types.

use thiserror::Error;

/// Errors that can occur while running the external fix tool.
#[derive(Debug, Error)]
pub enum InvocationError {
    /// Nothing in the working directory could be handed to the tool.
    #[error("No target files found in the repository")]
    NoTargetFiles,

    /// The tool did not finish within the configured deadline.
    #[error("Fix tool timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The tool exited unsuccessfully.
    #[error("Fix tool exited with {}: {stderr}", exit_description(*.code))]
    Failed { code: Option<i32>, stderr: String },

    /// The tool process could not be started or awaited.
    #[error("Failed to run fix tool: {0}")]
    Spawn(#[source] std::io::Error),

    /// The prompt file could not be written.
    #[error("Failed to write prompt file: {0}")]
    PromptFile(#[source] std::io::Error),
}

fn exit_description(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}
