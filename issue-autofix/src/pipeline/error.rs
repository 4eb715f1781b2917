//! Pipeline error types.

use super::WorkspaceError;
use crate::fix_tool::InvocationError;
use crate::platform::PlatformError;
use crate::templates::TemplateError;
use thiserror::Error;

/// Unexpected errors that end a run outside the stage failure paths.
///
/// These become [`RunOutcome::Errored`](super::RunOutcome::Errored) and an
/// "an error occurred" comment.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Hosting platform call failed.
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// Comment rendering failed.
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Failures of the `fixing` stage.
#[derive(Debug, Error)]
pub(crate) enum FixError {
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error(transparent)]
    Invocation(#[from] InvocationError),
}
