//! Publishing error types.

use crate::pipeline::RunStage;
use crate::platform::PlatformError;
use crate::templates::TemplateError;
use thiserror::Error;

/// Errors that can occur while publishing a changeset.
#[derive(Debug, Error)]
pub enum PublishError {
    /// There is nothing to publish.
    #[error("Changeset is empty, nothing to publish")]
    EmptyChangeset,

    /// The default branch or its head commit could not be resolved.
    #[error("Failed to resolve base branch: {0}")]
    BaseBranch(#[source] PlatformError),

    /// The fix branch could not be created.
    #[error("Failed to create branch '{branch}': {message}")]
    BranchExists { branch: String, message: String },

    /// A file could not be patched or written. Earlier writes stay in place.
    #[error("Failed to write '{path}': {message}")]
    FileWriteFailed { path: String, message: String },

    /// Every edit matched the existing content.
    #[error("The changes are identical to the current branch content")]
    NoEffectiveChanges,

    /// The pull request body could not be rendered.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The pull request could not be opened.
    #[error("Failed to create pull request: {message}")]
    PullRequestFailed { message: String },
}

impl PublishError {
    /// Returns the pipeline stage this failure belongs to.
    pub fn stage(&self) -> RunStage {
        match self {
            Self::Template(_) | Self::PullRequestFailed { .. } => RunStage::PullRequesting,
            _ => RunStage::Committing,
        }
    }
}
