//! Disposable working copies of target repositories.

use crate::config::Secret;
use crate::platform::RepoRef;
use futures::future::{BoxFuture, FutureExt};
use std::path::Path;
use std::process::Stdio;
use tempfile::TempDir;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;
use url::Url;

/// Errors preparing a working copy.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// The temporary directory could not be created or populated.
    #[error("Failed to prepare working directory: {0}")]
    TempDir(#[source] std::io::Error),

    /// git could not be started.
    #[error("Failed to execute git clone: {0}")]
    Spawn(#[source] std::io::Error),

    /// git ran but the clone failed.
    #[error("git clone failed: {message}")]
    CloneFailed { message: String },

    /// The clone URL could not be built.
    #[error("Invalid clone URL: {message}")]
    InvalidUrl { message: String },
}

/// Populates a directory with a checkout of a repository.
pub trait Cloner: Send + Sync {
    /// Clones `repo` into the existing, empty directory `dest`.
    fn clone_repository<'a>(
        &'a self,
        repo: &'a RepoRef,
        dest: &'a Path,
    ) -> BoxFuture<'a, Result<(), WorkspaceError>>;
}

/// Creates the run's temporary directory. It is removed when dropped.
pub(crate) fn create_work_dir() -> Result<TempDir, WorkspaceError> {
    tempfile::Builder::new()
        .prefix("issue-autofix-")
        .tempdir()
        .map_err(WorkspaceError::TempDir)
}

/// Shallow `git clone` over HTTPS with the token embedded in the URL.
#[derive(Debug, Clone)]
pub struct GitCloner {
    web_url: String,
    token: Secret,
}

impl GitCloner {
    /// Creates a cloner for repositories under `web_url` (e.g. `https://github.com`).
    pub fn new(web_url: impl Into<String>, token: Secret) -> Self {
        Self {
            web_url: web_url.into(),
            token,
        }
    }

    /// Builds `https://x-access-token:<token>@host/owner/name.git`.
    fn clone_url(&self, repo: &RepoRef) -> Result<Url, WorkspaceError> {
        let invalid = |message: String| WorkspaceError::InvalidUrl { message };

        let mut base = Url::parse(&self.web_url).map_err(|e| invalid(e.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let mut url = base
            .join(&format!("{}/{}.git", repo.owner, repo.name))
            .map_err(|e| invalid(e.to_string()))?;
        url.set_username("x-access-token")
            .and_then(|()| url.set_password(Some(self.token.expose())))
            .map_err(|()| invalid(format!("cannot embed credentials in '{}'", self.web_url)))?;
        Ok(url)
    }

    fn redact(&self, text: &str) -> String {
        if self.token.is_blank() {
            return text.to_string();
        }
        text.replace(self.token.expose(), "****")
    }

    async fn clone_into(&self, repo: &RepoRef, dest: &Path) -> Result<(), WorkspaceError> {
        debug!(repo = %repo, "Cloning repository");
        let url = self.clone_url(repo)?;

        let output = Command::new("git")
            .args(["clone", "--depth", "1", url.as_str(), "."])
            .current_dir(dest)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(WorkspaceError::Spawn)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WorkspaceError::CloneFailed {
                message: self.redact(stderr.trim()),
            });
        }

        Ok(())
    }
}

impl Cloner for GitCloner {
    fn clone_repository<'a>(
        &'a self,
        repo: &'a RepoRef,
        dest: &'a Path,
    ) -> BoxFuture<'a, Result<(), WorkspaceError>> {
        self.clone_into(repo, dest).boxed()
    }
}
