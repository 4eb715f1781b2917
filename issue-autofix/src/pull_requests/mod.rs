//! Publishing a changeset as a branch and pull request.
//!
//! Files are committed one at a time through the contents API, so there is no
//! local push. A failure part way through leaves earlier commits on the
//! branch; nothing is rolled back.

mod error;

pub use error::PublishError;

use crate::changeset::{Changeset, FileChange};
use crate::config::PrPolicy;
use crate::issues::IssueDetails;
use crate::patch::apply_patch;
use crate::platform::{FileWrite, HostingPlatform, NewPullRequest, PrReference, RepoRef};
use crate::templates::{generate_commit_message, generate_pr_title, TemplateRenderer};
use tracing::{debug, info, info_span, warn, Instrument};

/// Publishes a changeset as a pull request that closes `issue`.
///
/// This function:
/// 1. Creates `branch_name` from the default branch head
/// 2. Writes each file (patches are applied to the branch content)
/// 3. Opens the pull request
/// 4. Requests reviewers and adds labels (best effort)
///
/// # Arguments
///
/// * `platform` - Hosting platform client
/// * `issue` - Issue being fixed (repository, number, title)
/// * `branch_name` - Branch to create
/// * `changeset` - Edits to commit
/// * `policy` - Draft flag, reviewers and labels
/// * `renderer` - Template renderer for the pull request body
///
/// # Returns
///
/// The opened pull request.
///
/// # Errors
///
/// Returns [`PublishError`] for an empty changeset, a branch that cannot be
/// created, a file that cannot be written, or a pull request that cannot be
/// opened. Use [`PublishError::stage`] to tell commit failures from pull
/// request failures.
pub async fn publish(
    platform: &dyn HostingPlatform,
    issue: &IssueDetails,
    branch_name: &str,
    changeset: &Changeset,
    policy: &PrPolicy,
    renderer: &TemplateRenderer,
) -> Result<PrReference, PublishError> {
    let repo = &issue.repository;
    let span = info_span!(
        "publish",
        repo = %repo,
        issue_number = issue.number,
        branch = %branch_name
    );

    async {
        if changeset.is_empty() {
            return Err(PublishError::EmptyChangeset);
        }

        let base = platform
            .default_branch(repo)
            .await
            .map_err(PublishError::BaseBranch)?;
        let base_sha = platform
            .branch_head(repo, &base)
            .await
            .map_err(PublishError::BaseBranch)?;

        platform
            .create_branch(repo, branch_name, &base_sha)
            .await
            .map_err(|e| PublishError::BranchExists {
                branch: branch_name.to_string(),
                message: e.to_string(),
            })?;
        info!(base = %base, "Created branch");

        let mut written = 0usize;
        for (path, change) in &changeset.files {
            let changed = write_file(platform, repo, issue, branch_name, path, change)
                .await
                .map_err(|message| PublishError::FileWriteFailed {
                    path: path.clone(),
                    message,
                })?;
            if changed {
                written += 1;
            }
        }
        if written == 0 {
            return Err(PublishError::NoEffectiveChanges);
        }
        info!(files = written, "Committed changes");

        let body = renderer.render_pr_body(issue, &changeset.solution)?;
        let request = NewPullRequest {
            title: generate_pr_title(issue),
            head: branch_name.to_string(),
            base,
            body,
            draft: policy.draft,
        };
        let pull_request = platform
            .create_pull_request(repo, &request)
            .await
            .map_err(|e| PublishError::PullRequestFailed {
                message: e.to_string(),
            })?;
        info!(pr_number = pull_request.number, "Pull request created");

        apply_pr_extras(platform, repo, pull_request.number, policy).await;
        Ok(pull_request)
    }
    .instrument(span)
    .await
}

/// Commits one file. Returns `Ok(false)` when the content is unchanged.
async fn write_file(
    platform: &dyn HostingPlatform,
    repo: &RepoRef,
    issue: &IssueDetails,
    branch: &str,
    path: &str,
    change: &FileChange,
) -> Result<bool, String> {
    let existing = platform
        .get_file(repo, path, branch)
        .await
        .map_err(|e| e.to_string())?;

    let content = match change {
        FileChange::Replace(content) => content.clone(),
        FileChange::Patch(diff) => {
            let current = existing.as_ref().map_or("", |file| file.content.as_str());
            apply_patch(current, diff).map_err(|e| e.to_string())?
        }
    };

    if existing
        .as_ref()
        .is_some_and(|file| file.content == content)
    {
        debug!(path, "Content unchanged, skipping");
        return Ok(false);
    }

    let write = FileWrite {
        path: path.to_string(),
        branch: branch.to_string(),
        message: generate_commit_message(issue, path),
        content,
    };
    match &existing {
        Some(file) => platform.update_file(repo, &write, &file.sha).await,
        None => platform.create_file(repo, &write).await,
    }
    .map_err(|e| e.to_string())?;

    debug!(path, created = existing.is_none(), "Wrote file");
    Ok(true)
}

/// Requests reviewers and adds labels, logging failures.
async fn apply_pr_extras(
    platform: &dyn HostingPlatform,
    repo: &RepoRef,
    pr_number: u64,
    policy: &PrPolicy,
) {
    if !policy.reviewers.is_empty() {
        if let Err(e) = platform
            .request_reviewers(repo, pr_number, &policy.reviewers)
            .await
        {
            warn!(pr_number, error = %e, "Failed to request reviewers");
        }
    }

    if !policy.labels.is_empty() {
        if let Err(e) = platform.add_labels(repo, pr_number, &policy.labels).await {
            warn!(pr_number, error = %e, "Failed to add labels");
        }
    }
}
