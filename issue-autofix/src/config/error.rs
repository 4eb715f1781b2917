//! Configuration error types.

use thiserror::Error;

/// Errors that can occur while loading service configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML content.
    #[error("Failed to parse config file '{path}': {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// The merged configuration is unusable.
    #[error("Invalid configuration: {message}")]
    Validation { message: String },
}
