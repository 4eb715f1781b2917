//! Hosting platform error types.

use thiserror::Error;

/// Errors returned by [`HostingPlatform`](super::HostingPlatform) calls.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// GitHub API error.
    #[error("GitHub API error: {0}")]
    GitHub(#[from] octocrab::Error),

    /// The target already exists (e.g. a branch name collision).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The platform answered with something the pipeline cannot use.
    #[error("Unexpected response: {0}")]
    Unexpected(String),
}
