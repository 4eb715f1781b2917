//! In-memory doubles shared by unit tests.

use crate::issues::IssueDetails;
use crate::pipeline::{Cloner, WorkspaceError};
use crate::platform::{
    FileWrite, HostingPlatform, NewPullRequest, PlatformError, PrReference, RemoteFile, RepoRef,
};
use chrono::{TimeZone, Utc};
use futures::future::{self, BoxFuture, FutureExt};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Builds an issue in `octo/widgets` titled "Webhook handler crashes".
pub(crate) fn sample_issue(number: u64, body: &str, labels: &[&str]) -> IssueDetails {
    let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    IssueDetails {
        number,
        title: "Webhook handler crashes".to_string(),
        body: body.to_string(),
        author: "reporter".to_string(),
        created_at,
        updated_at: created_at,
        labels: labels.iter().map(ToString::to_string).collect(),
        url: format!("https://github.com/octo/widgets/issues/{number}"),
        repository: RepoRef::new("octo", "widgets"),
    }
}

/// Writes an executable `/bin/sh` script and returns its path.
#[cfg(unix)]
pub(crate) fn write_tool_script(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fix-tool.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// A file write as the fake platform saw it.
#[derive(Debug, Clone)]
pub(crate) struct RecordedWrite {
    pub path: String,
    pub branch: String,
    pub message: String,
    pub content: String,

    /// SHA passed on update, `None` for creates.
    pub sha: Option<String>,
}

#[derive(Debug)]
pub(crate) struct FakeState {
    pub issues: HashMap<u64, IssueDetails>,
    pub default_branch: String,
    pub branches: HashMap<String, String>,
    pub files: HashMap<String, RemoteFile>,
    pub comments: Vec<(u64, String)>,
    pub created_branches: Vec<String>,
    pub writes: Vec<RecordedWrite>,
    pub pull_requests: Vec<NewPullRequest>,
    pub reviewers: Vec<(u64, Vec<String>)>,
    pub labels: Vec<(u64, Vec<String>)>,
    pub fail_fetch_issue: bool,
    pub fail_comments: bool,
    pub fail_write_path: Option<String>,
    pub fail_pull_request: bool,
    pub fail_reviewers: bool,
    next_sha: u64,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            issues: HashMap::new(),
            default_branch: "main".to_string(),
            branches: HashMap::from([("main".to_string(), "base-sha".to_string())]),
            files: HashMap::new(),
            comments: Vec::new(),
            created_branches: Vec::new(),
            writes: Vec::new(),
            pull_requests: Vec::new(),
            reviewers: Vec::new(),
            labels: Vec::new(),
            fail_fetch_issue: false,
            fail_comments: false,
            fail_write_path: None,
            fail_pull_request: false,
            fail_reviewers: false,
            next_sha: 0,
        }
    }
}

impl FakeState {
    fn next_sha(&mut self) -> String {
        self.next_sha += 1;
        format!("blob-{}", self.next_sha)
    }

    fn record_write(&mut self, write: &FileWrite, sha: Option<&str>) -> Result<(), PlatformError> {
        if self.fail_write_path.as_deref() == Some(write.path.as_str()) {
            return Err(PlatformError::Unexpected(format!(
                "write rejected for {}",
                write.path
            )));
        }
        let new_sha = self.next_sha();
        self.files.insert(
            write.path.clone(),
            RemoteFile {
                content: write.content.clone(),
                sha: new_sha,
            },
        );
        self.writes.push(RecordedWrite {
            path: write.path.clone(),
            branch: write.branch.clone(),
            message: write.message.clone(),
            content: write.content.clone(),
            sha: sha.map(ToString::to_string),
        });
        Ok(())
    }
}

/// In-memory [`HostingPlatform`]. Files are shared by all branches.
#[derive(Debug, Default)]
pub(crate) struct FakePlatform {
    state: Mutex<FakeState>,
}

impl FakePlatform {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_issue(self, issue: IssueDetails) -> Self {
        self.configure(|state| {
            state.issues.insert(issue.number, issue);
        });
        self
    }

    pub(crate) fn with_file(self, path: &str, content: &str) -> Self {
        self.configure(|state| {
            let sha = state.next_sha();
            state.files.insert(
                path.to_string(),
                RemoteFile {
                    content: content.to_string(),
                    sha,
                },
            );
        });
        self
    }

    pub(crate) fn with_branch(self, branch: &str) -> Self {
        self.configure(|state| {
            state
                .branches
                .insert(branch.to_string(), "existing-sha".to_string());
        });
        self
    }

    pub(crate) fn configure(&self, f: impl FnOnce(&mut FakeState)) {
        f(&mut self.state());
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    /// Comment bodies posted on `number`, in order.
    pub(crate) fn comments_on(&self, number: u64) -> Vec<String> {
        self.state()
            .comments
            .iter()
            .filter(|(n, _)| *n == number)
            .map(|(_, body)| body.clone())
            .collect()
    }
}

fn ready<'a, T: Send + 'a>(result: Result<T, PlatformError>) -> BoxFuture<'a, Result<T, PlatformError>> {
    future::ready(result).boxed()
}

impl HostingPlatform for FakePlatform {
    fn fetch_issue<'a>(
        &'a self,
        _repo: &'a RepoRef,
        number: u64,
    ) -> BoxFuture<'a, Result<IssueDetails, PlatformError>> {
        let state = self.state();
        let result = if state.fail_fetch_issue {
            Err(PlatformError::Unexpected("issue lookup failed".to_string()))
        } else {
            state
                .issues
                .get(&number)
                .cloned()
                .ok_or_else(|| PlatformError::Unexpected(format!("issue {number} not found")))
        };
        ready(result)
    }

    fn post_comment<'a>(
        &'a self,
        _repo: &'a RepoRef,
        number: u64,
        body: &'a str,
    ) -> BoxFuture<'a, Result<(), PlatformError>> {
        let mut state = self.state();
        let result = if state.fail_comments {
            Err(PlatformError::Unexpected("comments disabled".to_string()))
        } else {
            state.comments.push((number, body.to_string()));
            Ok(())
        };
        ready(result)
    }

    fn default_branch<'a>(&'a self, _repo: &'a RepoRef) -> BoxFuture<'a, Result<String, PlatformError>> {
        ready(Ok(self.state().default_branch.clone()))
    }

    fn branch_head<'a>(
        &'a self,
        _repo: &'a RepoRef,
        branch: &'a str,
    ) -> BoxFuture<'a, Result<String, PlatformError>> {
        let result = self
            .state()
            .branches
            .get(branch)
            .cloned()
            .ok_or_else(|| PlatformError::Unexpected(format!("no branch {branch}")));
        ready(result)
    }

    fn create_branch<'a>(
        &'a self,
        _repo: &'a RepoRef,
        branch: &'a str,
        sha: &'a str,
    ) -> BoxFuture<'a, Result<(), PlatformError>> {
        let mut state = self.state();
        let result = if state.branches.contains_key(branch) {
            Err(PlatformError::Conflict(format!("branch {branch} already exists")))
        } else {
            state.branches.insert(branch.to_string(), sha.to_string());
            state.created_branches.push(branch.to_string());
            Ok(())
        };
        ready(result)
    }

    fn get_file<'a>(
        &'a self,
        _repo: &'a RepoRef,
        path: &'a str,
        _branch: &'a str,
    ) -> BoxFuture<'a, Result<Option<RemoteFile>, PlatformError>> {
        ready(Ok(self.state().files.get(path).cloned()))
    }

    fn create_file<'a>(
        &'a self,
        _repo: &'a RepoRef,
        write: &'a FileWrite,
    ) -> BoxFuture<'a, Result<(), PlatformError>> {
        ready(self.state().record_write(write, None))
    }

    fn update_file<'a>(
        &'a self,
        _repo: &'a RepoRef,
        write: &'a FileWrite,
        sha: &'a str,
    ) -> BoxFuture<'a, Result<(), PlatformError>> {
        ready(self.state().record_write(write, Some(sha)))
    }

    fn create_pull_request<'a>(
        &'a self,
        repo: &'a RepoRef,
        pull_request: &'a NewPullRequest,
    ) -> BoxFuture<'a, Result<PrReference, PlatformError>> {
        let mut state = self.state();
        let result = if state.fail_pull_request {
            Err(PlatformError::Unexpected("validation failed".to_string()))
        } else {
            state.pull_requests.push(pull_request.clone());
            let number = state.pull_requests.len() as u64;
            Ok(PrReference {
                number,
                url: format!("https://github.com/{repo}/pull/{number}"),
            })
        };
        ready(result)
    }

    fn request_reviewers<'a>(
        &'a self,
        _repo: &'a RepoRef,
        pr_number: u64,
        reviewers: &'a [String],
    ) -> BoxFuture<'a, Result<(), PlatformError>> {
        let mut state = self.state();
        let result = if state.fail_reviewers {
            Err(PlatformError::Unexpected("reviewer not a collaborator".to_string()))
        } else {
            state.reviewers.push((pr_number, reviewers.to_vec()));
            Ok(())
        };
        ready(result)
    }

    fn add_labels<'a>(
        &'a self,
        _repo: &'a RepoRef,
        number: u64,
        labels: &'a [String],
    ) -> BoxFuture<'a, Result<(), PlatformError>> {
        self.state().labels.push((number, labels.to_vec()));
        ready(Ok(()))
    }
}

/// [`Cloner`] that writes a fixed file set instead of running git.
#[derive(Debug, Default)]
pub(crate) struct FakeCloner {
    files: Vec<(String, String)>,
    fail: bool,
    last_dest: Mutex<Option<PathBuf>>,
}

impl FakeCloner {
    pub(crate) fn with_files(files: &[(&str, &str)]) -> Self {
        Self {
            files: files
                .iter()
                .map(|(path, content)| (path.to_string(), content.to_string()))
                .collect(),
            ..Self::default()
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Destination of the most recent clone.
    pub(crate) fn last_dest(&self) -> Option<PathBuf> {
        self.last_dest.lock().unwrap().clone()
    }
}

impl Cloner for FakeCloner {
    fn clone_repository<'a>(
        &'a self,
        _repo: &'a RepoRef,
        dest: &'a Path,
    ) -> BoxFuture<'a, Result<(), WorkspaceError>> {
        *self.last_dest.lock().unwrap() = Some(dest.to_path_buf());
        let result = if self.fail {
            Err(WorkspaceError::CloneFailed {
                message: "repository not found".to_string(),
            })
        } else {
            self.files.iter().try_for_each(|(path, content)| {
                let target = dest.join(path);
                if let Some(parent) = target.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(target, content)
            })
            .map_err(WorkspaceError::TempDir)
        };
        future::ready(result).boxed()
    }
}
