//! Issue events accepted by the pipeline.

use crate::platform::RepoRef;
use serde::Serialize;

/// Issue actions that start a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueAction {
    /// A new issue was opened.
    Opened,

    /// A label was added to an existing issue.
    Labeled,
}

impl IssueAction {
    /// Parses a webhook `action` field. Other actions are not handled.
    #[must_use]
    pub fn parse(action: &str) -> Option<Self> {
        match action {
            "opened" => Some(Self::Opened),
            "labeled" => Some(Self::Labeled),
            _ => None,
        }
    }

    /// Returns the wire name of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Opened => "opened",
            Self::Labeled => "labeled",
        }
    }
}

/// A validated issue event ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueEvent {
    pub action: IssueAction,
    pub repository: RepoRef,
    pub issue_number: u64,
}
