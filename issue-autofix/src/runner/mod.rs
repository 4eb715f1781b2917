//! Wires configuration into a running webhook service.

mod error;

pub use error::RunnerError;

use crate::config::{AppConfig, ConfigError};
use crate::dispatcher::Dispatcher;
use crate::pipeline::{GitCloner, Pipeline, PipelineSettings};
use crate::platform::GitHubPlatform;
use crate::summary::RunSummary;
use crate::webhook::{router, WebhookState};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

/// The webhook service: an HTTP listener in front of a [`Dispatcher`].
pub struct Runner {
    config: AppConfig,
    dispatcher: Arc<Dispatcher>,
}

impl Runner {
    /// Builds the service against GitHub from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Config`] if the configuration is invalid, or
    /// [`RunnerError::Platform`] if the GitHub client cannot be built.
    pub fn new(config: AppConfig) -> Result<Self, RunnerError> {
        config.validate()?;
        let token = config
            .github
            .token
            .clone()
            .ok_or_else(|| ConfigError::Validation {
                message: "a GitHub token is required".to_string(),
            })?;

        let platform = GitHubPlatform::new(token.expose(), config.github.api_url.as_deref())?;
        let cloner = GitCloner::new(config.github.web_url.clone(), token);
        let settings = PipelineSettings {
            tool: config.tool.clone(),
            policy_path: config.github.policy_path.clone(),
        };
        let pipeline = Pipeline::new(Arc::new(platform), Arc::new(cloner), settings);
        Ok(Self::with_pipeline(config, pipeline))
    }

    /// Builds the service around an existing pipeline.
    pub fn with_pipeline(config: AppConfig, pipeline: Pipeline) -> Self {
        Self {
            config,
            dispatcher: Arc::new(Dispatcher::new(Arc::new(pipeline))),
        }
    }

    /// Binds the configured address and serves until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Bind`] if the address cannot be bound, or
    /// [`RunnerError::Serve`] if the server fails.
    pub async fn serve<F>(self, shutdown: F) -> Result<RunSummary, RunnerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let address = self.config.server.bind_address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| RunnerError::Bind { address, source })?;
        self.serve_listener(listener, shutdown).await
    }

    /// Serves on an already bound listener until `shutdown` resolves, then
    /// drains in-flight runs and returns the outcome counts.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Serve`] if the server fails.
    pub async fn serve_listener<F>(
        self,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<RunSummary, RunnerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Ok(address) = listener.local_addr() {
            info!(address = %address, "Listening for webhooks");
        }

        let state = Arc::new(WebhookState::new(
            Arc::clone(&self.dispatcher),
            self.config.github.webhook_secret.clone(),
        ));
        axum::serve(listener, router(state))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(RunnerError::Serve)?;

        info!("Server stopped, draining runs");
        let grace = Duration::from_secs(self.config.server.shutdown_grace_secs);
        self.dispatcher.shutdown(grace).await;
        Ok(self.dispatcher.summary())
    }
}
