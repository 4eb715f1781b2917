//! Run summary types.

use crate::pipeline::RunOutcome;
use serde::Serialize;

/// Counts of pipeline outcomes since the service started.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Number of runs started.
    pub runs_started: usize,

    /// Issues skipped by the label policy.
    pub ignored: usize,

    /// Issues scored below the fixability threshold.
    pub not_fixable: usize,

    /// Runs where the fix tool proposed no edits.
    pub no_fix_found: usize,

    /// Pull requests opened.
    pub prs_opened: usize,

    /// Runs that failed at a stage.
    pub failed: usize,

    /// Runs that hit an unexpected error.
    pub errored: usize,

    /// Runs cancelled on shutdown.
    pub cancelled: usize,
}

impl RunSummary {
    /// Creates a new empty summary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that a run was dispatched.
    pub fn record_started(&mut self) {
        self.runs_started += 1;
    }

    /// Updates the summary with a finished run.
    pub fn record(&mut self, outcome: &RunOutcome) {
        match outcome {
            RunOutcome::Ignored { .. } => self.ignored += 1,
            RunOutcome::NotFixable { .. } => self.not_fixable += 1,
            RunOutcome::NoFixFound => self.no_fix_found += 1,
            RunOutcome::PullRequestOpened { .. } => self.prs_opened += 1,
            RunOutcome::Failed { .. } => self.failed += 1,
            RunOutcome::Errored { .. } => self.errored += 1,
            RunOutcome::Cancelled => self.cancelled += 1,
        }
    }

    /// Returns the number of runs that have finished.
    #[must_use]
    pub fn finished(&self) -> usize {
        self.ignored
            + self.not_fixable
            + self.no_fix_found
            + self.prs_opened
            + self.failed
            + self.errored
            + self.cancelled
    }

    /// Returns true if any run ended in a failure.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.no_fix_found > 0 || self.failed > 0 || self.errored > 0
    }
}
