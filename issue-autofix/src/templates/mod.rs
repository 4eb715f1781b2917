//! Naming conventions and Handlebars-rendered messages.
//!
//! Branch names, pull request titles and commit messages are plain format
//! strings. Issue comments and the pull request body are rendered through
//! [`TemplateRenderer`].

mod error;
mod renderer;

pub use error::TemplateError;
pub use renderer::{create_handlebars_registry, TemplateRenderer};

use crate::issues::IssueDetails;

/// Generates the fix branch name for an issue.
///
/// Format: "fix/issue-{number}"
#[must_use]
pub fn generate_branch_name(issue_number: u64) -> String {
    format!("fix/issue-{issue_number}")
}

/// Generates the pull request title.
///
/// Format: "Fix issue #{number}: {title}"
#[must_use]
pub fn generate_pr_title(issue: &IssueDetails) -> String {
    format!("Fix issue #{}: {}", issue.number, issue.title)
}

/// Generates the commit message for one file write.
///
/// Format: "Fix #{number}: update {path}"
#[must_use]
pub fn generate_commit_message(issue: &IssueDetails, path: &str) -> String {
    format!("Fix #{}: update {path}", issue.number)
}
