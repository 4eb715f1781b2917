//! Runner error types.

/// Errors that can occur while starting or running the service.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// GitHub API client initialization errors.
    #[error(transparent)]
    Platform(#[from] crate::platform::PlatformError),

    /// The listen address could not be bound.
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP server stopped with an error.
    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}
