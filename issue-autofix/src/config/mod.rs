//! Service configuration.
//!
//! [`AppConfig`] is built once at startup from built-in defaults, an optional
//! TOML file and command-line overrides, then passed into the components that
//! need it. Per-repository policy lives in [`RepoConfig`].

mod error;
mod repo;
mod secret;

pub use error::ConfigError;
pub use repo::{
    load_repo_config, FilePolicy, LabelPolicy, PrPolicy, RepoConfig, DEFAULT_POLICY_PATH,
};
pub use secret::Secret;

use crate::fix_tool::ToolConfig;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Top-level service configuration.
///
/// Example `config.toml`:
///
/// ```toml
/// [server]
/// host = "127.0.0.1"
/// port = 8080
///
/// [github]
/// api-url = "https://ghe.example.com/api/v3"
/// web-url = "https://ghe.example.com"
///
/// [tool]
/// binary = "/usr/local/bin/aider"
/// model = "gpt-4o"
/// timeout-secs = 900
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub github: GitHubConfig,
    pub tool: ToolConfig,
}

/// Webhook listener settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Seconds to wait for in-flight runs on shutdown before cancelling them.
    pub shutdown_grace_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            shutdown_grace_secs: 30,
        }
    }
}

impl ServerConfig {
    /// Returns the `host:port` listen address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Hosting platform settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct GitHubConfig {
    /// API token (personal or installation).
    pub token: Option<Secret>,

    /// Shared secret for webhook signatures. Unset disables verification.
    pub webhook_secret: Option<Secret>,

    /// REST API base URL override (GitHub Enterprise).
    pub api_url: Option<String>,

    /// Web base URL used to build clone URLs.
    pub web_url: String,

    /// Location of the per-repository policy file.
    pub policy_path: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            webhook_secret: None,
            api_url: None,
            web_url: "https://github.com".to_string(),
            policy_path: DEFAULT_POLICY_PATH.to_string(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from an optional TOML file.
    ///
    /// A `None` path or a path that does not exist yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file exists but cannot be read, or
    /// [`ConfigError::Toml`] if it is not valid configuration.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            debug!("No config file given, using defaults");
            return Ok(Self::default());
        };

        if !path.exists() {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Toml {
            path: path.display().to_string(),
            source,
        })
    }

    /// Checks that the merged configuration can run the service.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.github.token {
            Some(token) if !token.is_blank() => {}
            _ => {
                return Err(ConfigError::Validation {
                    message: "a GitHub token is required (set GITHUB_TOKEN or --token)"
                        .to_string(),
                })
            }
        }

        if self.tool.binary.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: "tool binary must not be empty".to_string(),
            });
        }

        if self.tool.timeout_secs == 0 {
            return Err(ConfigError::Validation {
                message: "tool timeout must be at least one second".to_string(),
            });
        }

        if url::Url::parse(&self.github.web_url).is_err() {
            return Err(ConfigError::Validation {
                message: format!("invalid GitHub web URL '{}'", self.github.web_url),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn with_token(mut config: AppConfig) -> AppConfig {
        config.github.token = Some(Secret::new("ghp_test"));
        config
    }

    #[test]
    fn missing_path_yields_defaults() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.server.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.github.web_url, "https://github.com");
        assert_eq!(config.github.policy_path, ".github/autofix.yml");
        assert_eq!(config.tool.binary, "aider");
        assert_eq!(config.tool.model, "gpt-4-turbo-preview");
        assert_eq!(config.tool.timeout_secs, 600);
    }

    #[test]
    fn nonexistent_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig::load(Some(&temp_dir.path().join("missing.toml"))).unwrap();
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn file_values_override_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[server]
port = 9000

[github]
webhook-secret = "s3cret"

[tool]
model = "gpt-4o"
timeout-secs = 30
"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.github.webhook_secret, Some(Secret::new("s3cret")));
        assert_eq!(config.tool.model, "gpt-4o");
        assert_eq!(config.tool.binary, "aider");
        assert_eq!(config.tool.timeout_secs, 30);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[server\nport = ").unwrap();

        let result = AppConfig::load(Some(&path));
        assert!(matches!(result, Err(ConfigError::Toml { .. })));
    }

    #[test]
    fn unknown_keys_are_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[server]\nprot = 1\n").unwrap();

        assert!(matches!(
            AppConfig::load(Some(&path)),
            Err(ConfigError::Toml { .. })
        ));
    }

    #[test]
    fn validation_requires_token() {
        let result = AppConfig::default().validate();
        assert!(matches!(result, Err(ConfigError::Validation { .. })));

        let mut config = AppConfig::default();
        config.github.token = Some(Secret::new("   "));
        assert!(config.validate().is_err());

        assert!(with_token(AppConfig::default()).validate().is_ok());
    }

    #[test]
    fn validation_rejects_zero_timeout() {
        let mut config = with_token(AppConfig::default());
        config.tool.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_output_hides_token() {
        let config = with_token(AppConfig::default());
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("ghp_test"));
    }
}
