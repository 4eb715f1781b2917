//! Analyzer output types.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::{self, Write as _};

/// Coarse classification of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    Bug,
    Feature,
    Question,
}

impl IssueType {
    /// Returns the lowercase name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bug => "bug",
            Self::Feature => "feature",
            Self::Question => "question",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured signal extracted from an issue body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub issue_type: IssueType,

    /// File paths mentioned in the body, deduplicated and ordered.
    pub file_paths: BTreeSet<String>,

    /// Error lines and error-bearing code blocks, in order of appearance.
    pub error_messages: Vec<String>,

    /// Contents of fenced code blocks, in order of appearance.
    pub code_blocks: Vec<String>,

    /// Heuristic fixability score in `[0.0, 1.0]`.
    pub fix_potential: f64,

    /// `true` iff `fix_potential` reaches the fixable threshold.
    pub is_fixable: bool,
}

impl AnalysisResult {
    /// Renders a short plain-text summary for humans.
    pub fn summary(&self) -> String {
        let files = if self.file_paths.is_empty() {
            "None identified".to_string()
        } else {
            self.file_paths
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut out = String::new();
        let _ = writeln!(out, "Issue type: {}", self.issue_type);
        let _ = writeln!(out, "Affected files: {files}");
        let _ = writeln!(out, "Error messages found: {}", self.error_messages.len());
        let _ = writeln!(out, "Code blocks found: {}", self.code_blocks.len());
        let _ = writeln!(out, "Fix potential: {:.2}", self.fix_potential);
        out
    }
}
