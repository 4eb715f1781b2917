//! Pipeline stages and terminal outcomes.

use serde::Serialize;
use std::fmt;

/// Stage of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    Received,
    Filtered,
    Analyzing,
    Fixing,
    Committing,
    PullRequesting,
    Done,
}

impl RunStage {
    /// Returns the stage name as shown in issue comments and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Filtered => "filtered",
            Self::Analyzing => "analyzing",
            Self::Fixing => "fixing",
            Self::Committing => "committing",
            Self::PullRequesting => "pull_requesting",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a pipeline run ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    /// The issue was excluded by the label policy. No comment is posted.
    Ignored { reason: String },

    /// Analysis scored the issue below the fixability threshold.
    NotFixable { fix_potential: f64 },

    /// The fix tool ran but proposed no edits.
    NoFixFound,

    /// A pull request was opened.
    PullRequestOpened { number: u64, url: String },

    /// A stage failed.
    Failed { stage: RunStage, error: String },

    /// An unexpected error ended the run.
    Errored { error: String },

    /// The run was cancelled before it finished.
    Cancelled,
}

impl RunOutcome {
    /// Returns the outcome name used in logs and the run summary.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ignored { .. } => "ignored",
            Self::NotFixable { .. } => "not_fixable",
            Self::NoFixFound => "no_fix_found",
            Self::PullRequestOpened { .. } => "pull_request_opened",
            Self::Failed { .. } => "failed",
            Self::Errored { .. } => "errored",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether the run ended in a way a maintainer should look at.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::NoFixFound | Self::Failed { .. } | Self::Errored { .. }
        )
    }
}
