//! Issue snapshot as read from the hosting platform.

use crate::platform::RepoRef;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// An issue as it was when the pipeline read it.
#[derive(Debug, Clone, Serialize)]
pub struct IssueDetails {
    /// Issue number within the repository.
    pub number: u64,

    /// Issue title.
    pub title: String,

    /// Issue body (empty when the issue has no description).
    pub body: String,

    /// Login of the issue author.
    pub author: String,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,

    /// Label names currently on the issue.
    pub labels: Vec<String>,

    /// Web URL of the issue.
    pub url: String,

    /// Repository containing the issue.
    pub repository: RepoRef,
}
