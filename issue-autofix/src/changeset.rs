//! File-level edits produced by the fix tool.

use std::collections::BTreeMap;

/// How a single file should change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    /// Replace the whole file with this content.
    Replace(String),

    /// Apply this unified-diff body to the current content.
    Patch(String),
}

/// The edits for one issue, keyed by repository-relative path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changeset {
    pub files: BTreeMap<String, FileChange>,

    /// Narrative describing the fix, used as the pull request body.
    pub solution: String,
}

impl Changeset {
    pub fn new(files: BTreeMap<String, FileChange>, solution: impl Into<String>) -> Self {
        Self {
            files,
            solution: solution.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns the edited paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }
}
