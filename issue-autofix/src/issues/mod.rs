//! Issue snapshots, issue events and the label-based processing policy.

mod details;
mod event;

pub use details::IssueDetails;
pub use event::{IssueAction, IssueEvent};

use crate::config::LabelPolicy;

/// Outcome of checking an issue's labels against a [`LabelPolicy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelDecision {
    /// The issue may be processed.
    Process,

    /// The issue must be left alone.
    Skip {
        /// Human-readable reason, used for logging and the run outcome.
        reason: String,
    },
}

impl LabelDecision {
    /// Returns `true` if the issue may be processed.
    pub fn is_process(&self) -> bool {
        matches!(self, Self::Process)
    }
}

/// Decides whether an issue with the given labels should be processed.
///
/// Ignore labels always win. When the process list is non-empty, at least one
/// of its labels must be present. An empty process list admits every issue
/// that is not ignored.
///
/// # Arguments
///
/// * `labels` - Label names currently on the issue
/// * `policy` - Label policy from the repository configuration
pub fn should_process(labels: &[String], policy: &LabelPolicy) -> LabelDecision {
    if let Some(label) = labels.iter().find(|l| policy.ignore.contains(l)) {
        return LabelDecision::Skip {
            reason: format!("issue has ignore label '{label}'"),
        };
    }

    if policy.process.is_empty() || labels.iter().any(|l| policy.process.contains(l)) {
        return LabelDecision::Process;
    }

    LabelDecision::Skip {
        reason: format!(
            "issue has none of the required labels: {}",
            policy.process.join(", ")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    fn policy(process: &[&str], ignore: &[&str]) -> LabelPolicy {
        LabelPolicy {
            process: labels(process),
            ignore: labels(ignore),
        }
    }

    #[test]
    fn processes_issue_with_required_label() {
        let decision = should_process(&labels(&["bug"]), &LabelPolicy::default());
        assert!(decision.is_process());
    }

    #[test]
    fn ignore_label_wins_over_process_label() {
        let decision = should_process(&labels(&["bug", "wontfix"]), &LabelPolicy::default());
        assert_eq!(
            decision,
            LabelDecision::Skip {
                reason: "issue has ignore label 'wontfix'".to_string()
            }
        );
    }

    #[test]
    fn skips_issue_without_required_label() {
        let decision = should_process(&labels(&["docs"]), &LabelPolicy::default());
        assert!(!decision.is_process());
    }

    #[test]
    fn empty_process_list_admits_unlabelled_issues() {
        let decision = should_process(&[], &policy(&[], &["wontfix"]));
        assert!(decision.is_process());
    }

    #[test]
    fn empty_process_list_still_honours_ignore() {
        let decision = should_process(&labels(&["wontfix"]), &policy(&[], &["wontfix"]));
        assert!(!decision.is_process());
    }

    #[test]
    fn action_parsing_accepts_only_handled_actions() {
        assert_eq!(IssueAction::parse("opened"), Some(IssueAction::Opened));
        assert_eq!(IssueAction::parse("labeled"), Some(IssueAction::Labeled));
        assert_eq!(IssueAction::parse("closed"), None);
        assert_eq!(IssueAction::Labeled.as_str(), "labeled");
    }
}
