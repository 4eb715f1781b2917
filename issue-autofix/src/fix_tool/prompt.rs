//! Prompt construction for the fix tool.

use crate::analysis::AnalysisResult;
use crate::issues::IssueDetails;
use std::fmt::Write as _;

const INSTRUCTIONS: &str = "Please fix this issue based on the description and analysis above. \
Implement the minimal changes needed to resolve the problem. \
After making changes, explain what you did and why, starting the explanation with \"Solution:\".";

/// Builds the markdown prompt describing the issue to the tool.
///
/// The output depends only on its inputs.
pub fn build_prompt(issue: &IssueDetails, analysis: &AnalysisResult) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "# Issue #{}: {}", issue.number, issue.title);
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "## Description");
    let _ = writeln!(prompt, "{}", issue.body.trim());
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "## Analysis");

    if !analysis.file_paths.is_empty() {
        let _ = writeln!(prompt, "### Affected files");
        for path in &analysis.file_paths {
            let _ = writeln!(prompt, "- {path}");
        }
        let _ = writeln!(prompt);
    }

    if !analysis.error_messages.is_empty() {
        let _ = writeln!(prompt, "### Error messages");
        for message in &analysis.error_messages {
            let _ = writeln!(prompt, "```\n{message}\n```");
        }
        let _ = writeln!(prompt);
    }

    let _ = writeln!(prompt, "## Instructions");
    let _ = writeln!(prompt, "{INSTRUCTIONS}");
    prompt
}
