//! Background execution of pipeline runs.
//!
//! Each accepted event becomes a tracked, individually cancellable task so the
//! webhook handler can acknowledge immediately. Shutdown waits for in-flight
//! runs for a grace period and then cancels whatever is left.

use crate::issues::IssueEvent;
use crate::pipeline::{Pipeline, RunOutcome};
use crate::summary::RunSummary;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, info_span, warn, Instrument};

/// Errors returned by [`Dispatcher::dispatch`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// The dispatcher no longer accepts work.
    #[error("Service is shutting down")]
    ShuttingDown,
}

/// A dispatched run.
#[derive(Debug)]
pub struct RunHandle {
    id: u64,
    cancel: CancellationToken,
    outcome: oneshot::Receiver<RunOutcome>,
}

impl RunHandle {
    /// Sequential identifier, also recorded on the run's span.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Requests cancellation. The run ends as [`RunOutcome::Cancelled`] at its
    /// next await point, its working directory is removed and, if the fix
    /// attempt had started, the issue gets a cancellation comment.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Waits for the run to finish.
    ///
    /// Returns `None` if the task was aborted without reporting an outcome.
    pub async fn outcome(self) -> Option<RunOutcome> {
        self.outcome.await.ok()
    }
}

/// Spawns pipeline runs and tracks them until shutdown.
pub struct Dispatcher {
    pipeline: Arc<Pipeline>,
    tracker: TaskTracker,
    shutdown: CancellationToken,
    next_id: AtomicU64,
    summary: Arc<Mutex<RunSummary>>,
}

impl Dispatcher {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self {
            pipeline,
            tracker: TaskTracker::new(),
            shutdown: CancellationToken::new(),
            next_id: AtomicU64::new(1),
            summary: Arc::new(Mutex::new(RunSummary::new())),
        }
    }

    /// Starts a run for `event` without waiting for it.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::ShuttingDown`] once [`shutdown`](Self::shutdown)
    /// has been called.
    pub fn dispatch(&self, event: IssueEvent) -> Result<RunHandle, DispatchError> {
        if self.tracker.is_closed() {
            return Err(DispatchError::ShuttingDown);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel = self.shutdown.child_token();
        let (sender, receiver) = oneshot::channel();
        let span = info_span!(
            "pipeline_run",
            run_id = id,
            repo = %event.repository,
            issue_number = event.issue_number
        );

        lock(&self.summary).record_started();

        let pipeline = Arc::clone(&self.pipeline);
        let summary = Arc::clone(&self.summary);
        let token = cancel.clone();
        self.tracker.spawn(
            async move {
                let outcome = pipeline.run_until_cancelled(&event, &token).await;
                lock(&summary).record(&outcome);
                // The handle may have been dropped.
                let _ = sender.send(outcome);
            }
            .instrument(span),
        );

        Ok(RunHandle {
            id,
            cancel,
            outcome: receiver,
        })
    }

    /// Returns the number of runs still in flight.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Stops accepting runs, waits up to `grace` for in-flight runs, then
    /// cancels the rest and waits for them to unwind.
    pub async fn shutdown(&self, grace: Duration) {
        self.tracker.close();
        info!(in_flight = self.tracker.len(), "Waiting for in-flight runs");

        if tokio::time::timeout(grace, self.tracker.wait()).await.is_err() {
            warn!(
                remaining = self.tracker.len(),
                "Grace period elapsed, cancelling runs"
            );
            self.shutdown.cancel();
            self.tracker.wait().await;
        }
        info!("All runs finished");
    }

    /// Returns a snapshot of the outcome counts.
    pub fn summary(&self) -> RunSummary {
        lock(&self.summary).clone()
    }
}

fn lock(summary: &Mutex<RunSummary>) -> std::sync::MutexGuard<'_, RunSummary> {
    summary.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::fix_tool::ToolConfig;
    use crate::issues::IssueAction;
    use crate::pipeline::PipelineSettings;
    use crate::platform::RepoRef;
    use crate::testing::{sample_issue, write_tool_script, FakeCloner, FakePlatform};
    use tempfile::TempDir;

    const FIXABLE_BODY: &str = "Error: KeyError 'action' in src/app.py. Steps to reproduce: send webhook without action field.";

    fn event(number: u64) -> IssueEvent {
        IssueEvent {
            action: IssueAction::Labeled,
            repository: RepoRef::new("octo", "widgets"),
            issue_number: number,
        }
    }

    /// Dispatcher whose fix tool sleeps far longer than any test waits.
    fn slow_dispatcher(scripts: &TempDir) -> (Dispatcher, Arc<FakePlatform>, Arc<FakeCloner>) {
        let platform = FakePlatform::new()
            .with_issue(sample_issue(1, FIXABLE_BODY, &["bug"]))
            .with_issue(sample_issue(2, "Question?", &["wontfix"]));
        let cloner = Arc::new(FakeCloner::with_files(&[("src/app.py", "x = 1\n")]));
        let settings = PipelineSettings {
            tool: ToolConfig {
                binary: write_tool_script(scripts.path(), "sleep 60\n")
                    .display()
                    .to_string(),
                timeout_secs: 120,
                ..ToolConfig::default()
            },
            ..PipelineSettings::default()
        };
        let platform = Arc::new(platform);
        let pipeline = Pipeline::new(platform.clone(), cloner.clone(), settings);
        (Dispatcher::new(Arc::new(pipeline)), platform, cloner)
    }

    async fn wait_for_clone(cloner: &FakeCloner) {
        for _ in 0..200 {
            if cloner.last_dest().is_some() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("run never reached the clone");
    }

    #[tokio::test]
    async fn dispatched_run_reports_outcome() {
        let scripts = TempDir::new().unwrap();
        let (dispatcher, platform, _) = slow_dispatcher(&scripts);

        let handle = dispatcher.dispatch(event(2)).unwrap();
        assert_eq!(handle.id(), 1);

        let outcome = handle.outcome().await.unwrap();
        assert!(matches!(outcome, RunOutcome::Ignored { .. }));

        let summary = dispatcher.summary();
        assert_eq!(summary.runs_started, 1);
        assert_eq!(summary.ignored, 1);
        assert!(platform.comments_on(2).is_empty());
    }

    #[tokio::test]
    async fn cancel_stops_run_and_removes_workspace() {
        let scripts = TempDir::new().unwrap();
        let (dispatcher, platform, cloner) = slow_dispatcher(&scripts);

        let handle = dispatcher.dispatch(event(1)).unwrap();
        wait_for_clone(&cloner).await;
        handle.cancel();

        assert_eq!(handle.outcome().await, Some(RunOutcome::Cancelled));
        assert!(!cloner.last_dest().unwrap().exists());
        assert_eq!(dispatcher.summary().cancelled, 1);

        let comments = platform.comments_on(1);
        assert_eq!(comments.len(), 2);
        assert!(comments[1].contains("stopped before it finished"));
        assert!(comments[1].contains("`fix/issue-1`"));
    }

    #[tokio::test]
    async fn shutdown_cancels_after_grace_and_rejects_new_runs() {
        let scripts = TempDir::new().unwrap();
        let (dispatcher, platform, cloner) = slow_dispatcher(&scripts);

        let handle = dispatcher.dispatch(event(1)).unwrap();
        wait_for_clone(&cloner).await;

        dispatcher.shutdown(Duration::from_millis(50)).await;

        assert_eq!(dispatcher.in_flight(), 0);
        assert_eq!(handle.outcome().await, Some(RunOutcome::Cancelled));
        assert_eq!(platform.comments_on(1).len(), 2);
        assert_eq!(
            dispatcher.dispatch(event(2)).unwrap_err(),
            DispatchError::ShuttingDown
        );
    }
}
