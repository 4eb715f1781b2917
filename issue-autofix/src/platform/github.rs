//! [`HostingPlatform`] implementation backed by the GitHub REST API.

use super::{
    FileWrite, HostingPlatform, NewPullRequest, PlatformError, PrReference, RemoteFile, RepoRef,
};
use crate::issues::IssueDetails;
use futures::future::{BoxFuture, FutureExt};
use octocrab::models::repos::Object;
use octocrab::params::repos::Reference;
use octocrab::Octocrab;
use tracing::debug;

/// GitHub client used by the pipeline.
#[derive(Clone)]
pub struct GitHubPlatform {
    octocrab: Octocrab,
}

impl GitHubPlatform {
    /// Builds an authenticated client.
    ///
    /// # Arguments
    ///
    /// * `token` - Personal access or installation token
    /// * `api_url` - Optional REST API base URL (GitHub Enterprise)
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::GitHub`] if the client cannot be constructed
    /// or `api_url` is not a valid URI.
    pub fn new(token: &str, api_url: Option<&str>) -> Result<Self, PlatformError> {
        let mut builder = Octocrab::builder().personal_token(token.to_string());
        if let Some(api_url) = api_url {
            builder = builder.base_uri(api_url)?;
        }
        Ok(Self {
            octocrab: builder.build()?,
        })
    }

    /// Wraps an existing octocrab client.
    pub fn from_octocrab(octocrab: Octocrab) -> Self {
        Self { octocrab }
    }
}

impl HostingPlatform for GitHubPlatform {
    fn fetch_issue<'a>(
        &'a self,
        repo: &'a RepoRef,
        number: u64,
    ) -> BoxFuture<'a, Result<IssueDetails, PlatformError>> {
        async move {
            let issue = self
                .octocrab
                .issues(&repo.owner, &repo.name)
                .get(number)
                .await?;

            Ok(IssueDetails {
                number: issue.number,
                title: issue.title,
                body: issue.body.unwrap_or_default(),
                author: issue.user.login,
                created_at: issue.created_at,
                updated_at: issue.updated_at,
                labels: issue.labels.into_iter().map(|label| label.name).collect(),
                url: issue.html_url.to_string(),
                repository: repo.clone(),
            })
        }
        .boxed()
    }

    fn post_comment<'a>(
        &'a self,
        repo: &'a RepoRef,
        number: u64,
        body: &'a str,
    ) -> BoxFuture<'a, Result<(), PlatformError>> {
        async move {
            self.octocrab
                .issues(&repo.owner, &repo.name)
                .create_comment(number, body)
                .await?;
            Ok(())
        }
        .boxed()
    }

    fn default_branch<'a>(&'a self, repo: &'a RepoRef) -> BoxFuture<'a, Result<String, PlatformError>> {
        async move {
            let repository = self.octocrab.repos(&repo.owner, &repo.name).get().await?;
            repository.default_branch.ok_or_else(|| {
                PlatformError::Unexpected(format!("{repo} reports no default branch"))
            })
        }
        .boxed()
    }

    fn branch_head<'a>(
        &'a self,
        repo: &'a RepoRef,
        branch: &'a str,
    ) -> BoxFuture<'a, Result<String, PlatformError>> {
        async move {
            let reference = self
                .octocrab
                .repos(&repo.owner, &repo.name)
                .get_ref(&Reference::Branch(branch.to_string()))
                .await?;

            match reference.object {
                Object::Commit { sha, .. } | Object::Tag { sha, .. } => Ok(sha),
                #[allow(unreachable_patterns)]
                _ => Err(PlatformError::Unexpected(format!(
                    "branch '{branch}' does not point at a commit"
                ))),
            }
        }
        .boxed()
    }

    fn create_branch<'a>(
        &'a self,
        repo: &'a RepoRef,
        branch: &'a str,
        sha: &'a str,
    ) -> BoxFuture<'a, Result<(), PlatformError>> {
        async move {
            let result = self
                .octocrab
                .repos(&repo.owner, &repo.name)
                .create_ref(&Reference::Branch(branch.to_string()), sha)
                .await;

            match result {
                Ok(_) => Ok(()),
                Err(e) if status_code(&e) == Some(422) => Err(PlatformError::Conflict(format!(
                    "branch '{branch}' already exists"
                ))),
                Err(e) => Err(e.into()),
            }
        }
        .boxed()
    }

    fn get_file<'a>(
        &'a self,
        repo: &'a RepoRef,
        path: &'a str,
        branch: &'a str,
    ) -> BoxFuture<'a, Result<Option<RemoteFile>, PlatformError>> {
        async move {
            let result = self
                .octocrab
                .repos(&repo.owner, &repo.name)
                .get_content()
                .path(path)
                .r#ref(branch)
                .send()
                .await;

            let items = match result {
                Ok(items) => items,
                Err(e) if status_code(&e) == Some(404) => {
                    debug!(path, branch, "File not found");
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            };

            let Some(item) = items.items.into_iter().next() else {
                return Ok(None);
            };
            if item.r#type != "file" {
                return Err(PlatformError::Unexpected(format!(
                    "'{path}' is a {}, not a file",
                    item.r#type
                )));
            }

            let content = item.decoded_content().ok_or_else(|| {
                PlatformError::Unexpected(format!("content of '{path}' could not be decoded"))
            })?;
            Ok(Some(RemoteFile {
                content,
                sha: item.sha,
            }))
        }
        .boxed()
    }

    fn create_file<'a>(
        &'a self,
        repo: &'a RepoRef,
        write: &'a FileWrite,
    ) -> BoxFuture<'a, Result<(), PlatformError>> {
        async move {
            self.octocrab
                .repos(&repo.owner, &repo.name)
                .create_file(&write.path, &write.message, &write.content)
                .branch(&write.branch)
                .send()
                .await?;
            Ok(())
        }
        .boxed()
    }

    fn update_file<'a>(
        &'a self,
        repo: &'a RepoRef,
        write: &'a FileWrite,
        sha: &'a str,
    ) -> BoxFuture<'a, Result<(), PlatformError>> {
        async move {
            self.octocrab
                .repos(&repo.owner, &repo.name)
                .update_file(&write.path, &write.message, &write.content, sha)
                .branch(&write.branch)
                .send()
                .await?;
            Ok(())
        }
        .boxed()
    }

    fn create_pull_request<'a>(
        &'a self,
        repo: &'a RepoRef,
        pull_request: &'a NewPullRequest,
    ) -> BoxFuture<'a, Result<PrReference, PlatformError>> {
        async move {
            let pr = self
                .octocrab
                .pulls(&repo.owner, &repo.name)
                .create(&pull_request.title, &pull_request.head, &pull_request.base)
                .body(&pull_request.body)
                .draft(pull_request.draft)
                .send()
                .await?;

            let url = pr
                .html_url
                .as_ref()
                .map(|u| u.to_string())
                .unwrap_or_else(|| format!("https://github.com/{repo}/pull/{}", pr.number));

            Ok(PrReference {
                number: pr.number,
                url,
            })
        }
        .boxed()
    }

    fn request_reviewers<'a>(
        &'a self,
        repo: &'a RepoRef,
        pr_number: u64,
        reviewers: &'a [String],
    ) -> BoxFuture<'a, Result<(), PlatformError>> {
        async move {
            self.octocrab
                .pulls(&repo.owner, &repo.name)
                .request_reviews(pr_number, reviewers.to_vec(), Vec::<String>::new())
                .await?;
            Ok(())
        }
        .boxed()
    }

    fn add_labels<'a>(
        &'a self,
        repo: &'a RepoRef,
        number: u64,
        labels: &'a [String],
    ) -> BoxFuture<'a, Result<(), PlatformError>> {
        async move {
            self.octocrab
                .issues(&repo.owner, &repo.name)
                .add_labels(number, labels)
                .await?;
            Ok(())
        }
        .boxed()
    }
}

/// Extracts the HTTP status from a GitHub API error, if it carries one.
fn status_code(error: &octocrab::Error) -> Option<u16> {
    match error {
        octocrab::Error::GitHub { source, .. } => Some(source.status_code.as_u16()),
        _ => None,
    }
}
