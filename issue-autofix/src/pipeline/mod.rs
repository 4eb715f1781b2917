//! Per-issue orchestration.
//!
//! A run moves through [`RunStage`]s: the issue is read and filtered by the
//! repository's label policy, analyzed, handed to the fix tool inside a
//! disposable clone and finally published as a pull request. Every run that
//! reaches the fixing stage ends with an issue comment.

mod error;
mod outcome;
mod workspace;

pub use error::PipelineError;
pub use outcome::{RunOutcome, RunStage};
pub use workspace::{Cloner, GitCloner, WorkspaceError};

use crate::analysis::{analyze, AnalysisResult};
use crate::changeset::Changeset;
use crate::config::{load_repo_config, RepoConfig, DEFAULT_POLICY_PATH};
use crate::fix_tool::{self, ToolConfig};
use crate::issues::{should_process, IssueDetails, IssueEvent, LabelDecision};
use crate::platform::{HostingPlatform, RepoRef};
use crate::pull_requests::publish;
use crate::templates::{generate_branch_name, TemplateError, TemplateRenderer};
use error::FixError;
use std::sync::{Arc, OnceLock};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Settings shared by every run.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// How to run the fix tool.
    pub tool: ToolConfig,

    /// Location of the repository policy file.
    pub policy_path: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            tool: ToolConfig::default(),
            policy_path: DEFAULT_POLICY_PATH.to_string(),
        }
    }
}

/// Drives issue events to a terminal [`RunOutcome`].
///
/// A pipeline holds no per-run state; one instance is shared by all
/// concurrently running events.
pub struct Pipeline {
    platform: Arc<dyn HostingPlatform>,
    cloner: Arc<dyn Cloner>,
    settings: PipelineSettings,
    renderer: TemplateRenderer,
}

impl Pipeline {
    pub fn new(
        platform: Arc<dyn HostingPlatform>,
        cloner: Arc<dyn Cloner>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            platform,
            cloner,
            settings,
            renderer: TemplateRenderer::new(),
        }
    }

    /// Processes one issue event.
    ///
    /// Never fails: unexpected errors are logged, reported on the issue as a
    /// best-effort comment and returned as [`RunOutcome::Errored`].
    pub async fn run(&self, event: &IssueEvent) -> RunOutcome {
        self.run_tracked(event, &OnceLock::new()).await
    }

    /// Processes one issue event until it finishes or `cancel` fires.
    ///
    /// A cancelled run is dropped at its next await point, which removes its
    /// clone and kills the fix tool. If the fixing comment was already posted,
    /// a cancellation comment closes the run on the issue.
    pub async fn run_until_cancelled(
        &self,
        event: &IssueEvent,
        cancel: &CancellationToken,
    ) -> RunOutcome {
        let fixing_branch = OnceLock::new();
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                warn!("Run cancelled");
                if let Some(branch) = fixing_branch.get() {
                    let comment = self.renderer.render_cancelled_comment(branch);
                    self.post_terminal_comment(&event.repository, event.issue_number, comment)
                        .await;
                }
                RunOutcome::Cancelled
            }
            outcome = self.run_tracked(event, &fixing_branch) => outcome,
        }
    }

    /// `fixing_branch` is set once the fixing comment has been posted.
    async fn run_tracked(&self, event: &IssueEvent, fixing_branch: &OnceLock<String>) -> RunOutcome {
        info!(action = event.action.as_str(), stage = %RunStage::Received, "Processing issue event");

        match self.try_run(event, fixing_branch).await {
            Ok(outcome) => {
                info!(outcome = outcome.as_str(), "Run finished");
                outcome
            }
            Err(e) => {
                error!(error = %e, "Run failed unexpectedly");
                let comment = self.renderer.render_error_comment(&e.to_string());
                self.post_terminal_comment(&event.repository, event.issue_number, comment)
                    .await;
                RunOutcome::Errored {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn try_run(
        &self,
        event: &IssueEvent,
        fixing_branch: &OnceLock<String>,
    ) -> Result<RunOutcome, PipelineError> {
        let repo = &event.repository;
        let platform = self.platform.as_ref();

        let issue = platform.fetch_issue(repo, event.issue_number).await?;
        let default_branch = platform.default_branch(repo).await?;
        let repo_config =
            load_repo_config(platform, repo, &default_branch, &self.settings.policy_path).await;

        if let LabelDecision::Skip { reason } = should_process(&issue.labels, &repo_config.labels)
        {
            info!(stage = %RunStage::Filtered, reason = %reason, "Skipping issue");
            return Ok(RunOutcome::Ignored { reason });
        }

        info!(stage = %RunStage::Analyzing, "Analyzing issue");
        let analysis = analyze(&issue.body);
        info!(
            issue_type = analysis.issue_type.as_str(),
            fix_potential = analysis.fix_potential,
            is_fixable = analysis.is_fixable,
            "Analysis complete"
        );
        if !analysis.is_fixable {
            let comment = self.renderer.render_not_fixable_comment(&analysis);
            self.post_terminal_comment(repo, issue.number, comment).await;
            return Ok(RunOutcome::NotFixable {
                fix_potential: analysis.fix_potential,
            });
        }

        let branch = generate_branch_name(issue.number);
        info!(stage = %RunStage::Fixing, branch = %branch, "Attempting fix");
        let comment = self.renderer.render_fixing_comment(&branch)?;
        platform.post_comment(repo, issue.number, &comment).await?;
        let _ = fixing_branch.set(branch.clone());

        let changeset = match self.generate_fix(&issue, &analysis, &repo_config).await {
            Ok(changeset) => changeset,
            Err(e) => return Ok(self.fail(&issue, RunStage::Fixing, &e.to_string(), &branch).await),
        };
        if changeset.is_empty() {
            let comment = self.renderer.render_no_fix_comment();
            self.post_terminal_comment(repo, issue.number, comment).await;
            return Ok(RunOutcome::NoFixFound);
        }

        info!(stage = %RunStage::Committing, files = changeset.len(), "Publishing fix");
        let pull_request = match publish(
            platform,
            &issue,
            &branch,
            &changeset,
            &repo_config.pr,
            &self.renderer,
        )
        .await
        {
            Ok(pull_request) => pull_request,
            Err(e) => return Ok(self.fail(&issue, e.stage(), &e.to_string(), &branch).await),
        };

        info!(stage = %RunStage::Done, pr_number = pull_request.number, "Fix published");
        let comment = self.renderer.render_success_comment(&pull_request);
        self.post_terminal_comment(repo, issue.number, comment).await;
        Ok(RunOutcome::PullRequestOpened {
            number: pull_request.number,
            url: pull_request.url,
        })
    }

    /// Clones the repository and runs the fix tool in it. The clone is
    /// removed when this returns or is dropped.
    async fn generate_fix(
        &self,
        issue: &IssueDetails,
        analysis: &AnalysisResult,
        repo_config: &RepoConfig,
    ) -> Result<Changeset, FixError> {
        let work_dir = workspace::create_work_dir()?;
        self.cloner
            .clone_repository(&issue.repository, work_dir.path())
            .await?;

        let changeset = fix_tool::invoke(
            issue,
            analysis,
            work_dir.path(),
            repo_config,
            &self.settings.tool,
        )
        .await?;
        Ok(changeset)
    }

    async fn fail(
        &self,
        issue: &IssueDetails,
        stage: RunStage,
        error: &str,
        branch: &str,
    ) -> RunOutcome {
        warn!(stage = %stage, error, "Stage failed");
        let comment = self.renderer.render_failed_comment(stage, error, branch);
        self.post_terminal_comment(&issue.repository, issue.number, comment)
            .await;
        RunOutcome::Failed {
            stage,
            error: error.to_string(),
        }
    }

    /// Posts a comment that ends the run. Failures are logged only.
    async fn post_terminal_comment(
        &self,
        repo: &RepoRef,
        number: u64,
        comment: Result<String, TemplateError>,
    ) {
        let result = match comment {
            Ok(body) => self
                .platform
                .post_comment(repo, number, &body)
                .await
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        if let Err(e) = result {
            error!(issue_number = number, error = %e, "Failed to post issue comment");
        }
    }
}
