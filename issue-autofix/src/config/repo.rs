//! Per-repository automation policy.
//!
//! Each target repository may commit a YAML policy file (by default
//! `.github/autofix.yml`) to its default branch:
//!
//! ```yaml
//! labels:
//!   process: [bug, fix-me]
//!   ignore: [discussion, wontfix]
//! files:
//!   include: ["src/**"]
//!   exclude: ["src/generated/**"]
//! pr:
//!   draft: true
//!   reviewers: [octocat]
//!   labels: [automated]
//! ```
//!
//! Every key is optional. A missing, malformed or unrecognised document falls
//! back to [`RepoConfig::default`].

use crate::platform::{HostingPlatform, RepoRef};
use serde::Deserialize;
use tracing::{debug, warn};

/// Default location of the policy file within a repository.
pub const DEFAULT_POLICY_PATH: &str = ".github/autofix.yml";

/// Repository policy controlling which issues are processed and how fixes
/// are proposed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    pub labels: LabelPolicy,
    pub files: FilePolicy,
    pub pr: PrPolicy,
}

/// Label filter applied before analysis.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LabelPolicy {
    /// Issues must carry one of these labels (empty means any issue).
    pub process: Vec<String>,

    /// Issues carrying any of these labels are never processed.
    pub ignore: Vec<String>,
}

impl Default for LabelPolicy {
    fn default() -> Self {
        Self {
            process: vec!["bug".to_string(), "fix-me".to_string()],
            ignore: vec!["discussion".to_string(), "wontfix".to_string()],
        }
    }
}

/// Glob patterns restricting which files the fix tool is pointed at.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilePolicy {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl Default for FilePolicy {
    fn default() -> Self {
        Self {
            include: vec!["**".to_string()],
            exclude: Vec::new(),
        }
    }
}

/// Pull request options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrPolicy {
    /// Open pull requests as drafts.
    pub draft: bool,

    /// Users asked to review (best effort).
    pub reviewers: Vec<String>,

    /// Labels added to the pull request (best effort).
    pub labels: Vec<String>,
}

impl RepoConfig {
    /// Parses a policy document strictly.
    ///
    /// An empty document yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns the YAML error for malformed documents or unknown keys.
    pub fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents)
    }

    /// Parses a policy document, falling back to defaults on any error.
    #[must_use]
    pub fn parse_or_default(contents: &str) -> Self {
        Self::parse(contents).unwrap_or_else(|e| {
            warn!(error = %e, "Invalid repository policy, using defaults");
            Self::default()
        })
    }
}

/// Loads a repository's policy from its default branch.
///
/// Never fails: a missing file, an API error or an invalid document all
/// produce [`RepoConfig::default`].
///
/// # Arguments
///
/// * `platform` - Hosting platform client
/// * `repo` - Repository to read from
/// * `branch` - Branch holding the policy (normally the default branch)
/// * `path` - Policy file path within the repository
pub async fn load_repo_config(
    platform: &dyn HostingPlatform,
    repo: &RepoRef,
    branch: &str,
    path: &str,
) -> RepoConfig {
    match platform.get_file(repo, path, branch).await {
        Ok(Some(file)) => {
            debug!(path, "Loaded repository policy");
            RepoConfig::parse_or_default(&file.content)
        }
        Ok(None) => {
            debug!(path, "No repository policy, using defaults");
            RepoConfig::default()
        }
        Err(e) => {
            warn!(path, error = %e, "Failed to read repository policy, using defaults");
            RepoConfig::default()
        }
    }
}
