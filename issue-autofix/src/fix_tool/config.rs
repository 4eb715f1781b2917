//! Fix-tool settings.

use crate::config::Secret;
use serde::Deserialize;
use std::time::Duration;

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// How to run the external code-editing tool.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ToolConfig {
    /// Executable name or path.
    pub binary: String,

    /// Model identifier passed with `--model`.
    pub model: String,

    /// API credential forwarded to the tool.
    pub api_key: Option<Secret>,

    /// Wall-clock limit for one invocation.
    pub timeout_secs: u64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            binary: "aider".to_string(),
            model: "gpt-4-turbo-preview".to_string(),
            api_key: None,
            timeout_secs: 600,
        }
    }
}

impl ToolConfig {
    /// Returns the invocation deadline.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Fills a missing API key from [`API_KEY_ENV`].
    ///
    /// Intended to be called once while assembling configuration at startup.
    #[must_use]
    pub fn with_env_fallback(mut self) -> Self {
        if self.api_key.is_none() {
            self.api_key = std::env::var(API_KEY_ENV)
                .ok()
                .filter(|key| !key.trim().is_empty())
                .map(Secret::new);
        }
        self
    }
}
