//! Hosting platform capability surface.
//!
//! The pipeline only reaches GitHub through [`HostingPlatform`]. The production
//! implementation is [`GitHubPlatform`] (octocrab); tests substitute an
//! in-memory fake.

mod error;
mod github;

pub use error::PlatformError;
pub use github::GitHubPlatform;

use crate::issues::IssueDetails;
use futures::future::BoxFuture;
use serde::Serialize;
use std::fmt;

/// Coordinates of a repository on the hosting platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RepoRef {
    /// Repository owner (user or organization).
    pub owner: String,

    /// Repository name.
    pub name: String,
}

impl RepoRef {
    /// Creates a repository reference from its owner and name.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parses an `owner/name` slug.
    ///
    /// Returns `None` unless the slug has exactly two non-empty segments.
    #[must_use]
    pub fn parse(full_name: &str) -> Option<Self> {
        let (owner, name) = full_name.split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self::new(owner, name))
    }

    /// Returns the repository name in `owner/name` format.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A file read from a branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Decoded file content.
    pub content: String,

    /// Blob SHA, required as the optimistic-concurrency token on update.
    pub sha: String,
}

/// A single-file commit to a branch.
#[derive(Debug, Clone)]
pub struct FileWrite {
    /// Repository-relative path.
    pub path: String,

    /// Branch receiving the commit.
    pub branch: String,

    /// Commit message.
    pub message: String,

    /// Full new file content.
    pub content: String,
}

/// Parameters for opening a pull request.
#[derive(Debug, Clone)]
pub struct NewPullRequest {
    pub title: String,
    pub head: String,
    pub base: String,
    pub body: String,
    pub draft: bool,
}

/// A pull request that was opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrReference {
    /// Pull request number.
    pub number: u64,

    /// Canonical web URL of the pull request.
    pub url: String,
}

/// The subset of the hosting platform API the pipeline consumes.
///
/// Methods return boxed futures so the trait stays object safe and can be
/// shared as `Arc<dyn HostingPlatform>` across concurrently running pipelines.
pub trait HostingPlatform: Send + Sync {
    /// Reads an issue snapshot.
    fn fetch_issue<'a>(
        &'a self,
        repo: &'a RepoRef,
        number: u64,
    ) -> BoxFuture<'a, Result<IssueDetails, PlatformError>>;

    /// Posts a comment on an issue or pull request.
    fn post_comment<'a>(
        &'a self,
        repo: &'a RepoRef,
        number: u64,
        body: &'a str,
    ) -> BoxFuture<'a, Result<(), PlatformError>>;

    /// Returns the repository's default branch name.
    fn default_branch<'a>(&'a self, repo: &'a RepoRef) -> BoxFuture<'a, Result<String, PlatformError>>;

    /// Returns the commit SHA at the tip of a branch.
    fn branch_head<'a>(
        &'a self,
        repo: &'a RepoRef,
        branch: &'a str,
    ) -> BoxFuture<'a, Result<String, PlatformError>>;

    /// Creates a branch pointing at `sha`.
    ///
    /// Fails with [`PlatformError::Conflict`] if the branch already exists.
    fn create_branch<'a>(
        &'a self,
        repo: &'a RepoRef,
        branch: &'a str,
        sha: &'a str,
    ) -> BoxFuture<'a, Result<(), PlatformError>>;

    /// Reads a file from a branch, returning `Ok(None)` if it does not exist.
    fn get_file<'a>(
        &'a self,
        repo: &'a RepoRef,
        path: &'a str,
        branch: &'a str,
    ) -> BoxFuture<'a, Result<Option<RemoteFile>, PlatformError>>;

    /// Creates a new file.
    fn create_file<'a>(
        &'a self,
        repo: &'a RepoRef,
        write: &'a FileWrite,
    ) -> BoxFuture<'a, Result<(), PlatformError>>;

    /// Replaces an existing file whose current blob SHA is `sha`.
    fn update_file<'a>(
        &'a self,
        repo: &'a RepoRef,
        write: &'a FileWrite,
        sha: &'a str,
    ) -> BoxFuture<'a, Result<(), PlatformError>>;

    /// Opens a pull request.
    fn create_pull_request<'a>(
        &'a self,
        repo: &'a RepoRef,
        pull_request: &'a NewPullRequest,
    ) -> BoxFuture<'a, Result<PrReference, PlatformError>>;

    /// Requests reviews from the given users.
    fn request_reviewers<'a>(
        &'a self,
        repo: &'a RepoRef,
        pr_number: u64,
        reviewers: &'a [String],
    ) -> BoxFuture<'a, Result<(), PlatformError>>;

    /// Adds labels to an issue or pull request.
    fn add_labels<'a>(
        &'a self,
        repo: &'a RepoRef,
        number: u64,
        labels: &'a [String],
    ) -> BoxFuture<'a, Result<(), PlatformError>>;
}
