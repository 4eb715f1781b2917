//! Issue webhook payload.

use crate::issues::{IssueAction, IssueEvent};
use crate::platform::RepoRef;
use serde::Deserialize;

/// The fields of an `issues` delivery the service reads. Everything else is
/// ignored.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub action: Option<String>,
    pub issue: Option<IssuePayload>,
    pub repository: Option<RepositoryPayload>,
}

#[derive(Debug, Deserialize)]
pub struct IssuePayload {
    pub number: u64,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryPayload {
    pub full_name: String,
}

impl WebhookPayload {
    /// Converts the delivery into an event, or explains why it is ignored.
    pub fn into_event(self) -> Result<IssueEvent, String> {
        let Some(name) = self.action else {
            return Err("No action specified".to_string());
        };
        let action =
            IssueAction::parse(&name).ok_or_else(|| format!("action '{name}' is not handled"))?;
        let issue = self
            .issue
            .ok_or_else(|| "payload carries no issue".to_string())?;
        let repository = self
            .repository
            .as_ref()
            .and_then(|repo| RepoRef::parse(&repo.full_name))
            .ok_or_else(|| "payload carries no valid repository".to_string())?;

        Ok(IssueEvent {
            action,
            repository,
            issue_number: issue.number,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> WebhookPayload {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn opened_issue_becomes_event() {
        let payload = parse(
            r#"{"action":"opened","issue":{"number":42,"title":"x"},"repository":{"full_name":"octo/widgets","private":false}}"#,
        );
        assert_eq!(
            payload.into_event().unwrap(),
            IssueEvent {
                action: IssueAction::Opened,
                repository: RepoRef::new("octo", "widgets"),
                issue_number: 42,
            }
        );
    }

    #[test]
    fn unsupported_action_is_ignored() {
        let payload = parse(r#"{"action":"closed","issue":{"number":1},"repository":{"full_name":"a/b"}}"#);
        assert_eq!(
            payload.into_event().unwrap_err(),
            "action 'closed' is not handled"
        );
    }

    #[test]
    fn missing_action_is_ignored() {
        let payload = parse(r#"{"zen":"Keep it simple","hook_id":1}"#);
        assert_eq!(payload.into_event().unwrap_err(), "No action specified");
    }

    #[test]
    fn missing_issue_is_ignored() {
        let payload = parse(r#"{"action":"labeled","repository":{"full_name":"a/b"}}"#);
        assert!(payload.into_event().is_err());
    }
}
