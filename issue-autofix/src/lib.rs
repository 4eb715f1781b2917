#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

pub mod analysis;
pub mod changeset;
pub mod config;
pub mod dispatcher;
pub mod fix_tool;
pub mod issues;
pub mod patch;
pub mod pipeline;
pub mod platform;
pub mod pull_requests;
pub mod runner;
pub mod summary;
pub mod templates;
pub mod webhook;

#[cfg(test)]
pub(crate) mod testing;

pub use analysis::{analyze, AnalysisResult, IssueType, FIXABLE_THRESHOLD};
pub use changeset::{Changeset, FileChange};
pub use config::{AppConfig, ConfigError, RepoConfig, Secret};
pub use dispatcher::{DispatchError, Dispatcher, RunHandle};
pub use fix_tool::{invoke, InvocationError, ToolConfig};
pub use issues::{should_process, IssueAction, IssueDetails, IssueEvent, LabelDecision};
pub use patch::{apply_patch, PatchError};
pub use pipeline::{
    Cloner, GitCloner, Pipeline, PipelineError, PipelineSettings, RunOutcome, RunStage,
    WorkspaceError,
};
pub use platform::{GitHubPlatform, HostingPlatform, PlatformError, PrReference, RepoRef};
pub use pull_requests::{publish, PublishError};
pub use runner::{Runner, RunnerError};
pub use summary::RunSummary;
pub use templates::{
    create_handlebars_registry, generate_branch_name, generate_pr_title, TemplateError,
    TemplateRenderer,
};
pub use webhook::{router, WebhookError, WebhookState};
