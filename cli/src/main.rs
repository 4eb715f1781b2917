//! CLI for the issue-autofix webhook service.
//!
//! Serves the GitHub webhook endpoint until interrupted, then waits for
//! in-flight runs and prints what they did.

use clap::Parser;
use issue_autofix::{AppConfig, RunSummary, Runner, RunnerError, Secret};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// issue-autofix - Turn fixable GitHub issues into pull requests.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML config file. Missing files are ignored.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on.
    #[arg(long, env = "AUTOFIX_HOST")]
    host: Option<String>,

    /// Port to listen on.
    #[arg(long, env = "AUTOFIX_PORT")]
    port: Option<u16>,

    /// GitHub token (personal access or installation token).
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Shared secret for webhook signatures.
    #[arg(long, env = "GITHUB_WEBHOOK_SECRET", hide_env_values = true)]
    webhook_secret: Option<String>,

    /// GitHub REST API base URL (GitHub Enterprise).
    #[arg(long, env = "GITHUB_API_URL")]
    api_url: Option<String>,

    /// Fix tool executable.
    #[arg(long, env = "AUTOFIX_TOOL_BINARY")]
    tool_binary: Option<String>,

    /// Model passed to the fix tool.
    #[arg(long, env = "AUTOFIX_TOOL_MODEL")]
    tool_model: Option<String>,

    /// API key passed to the fix tool (falls back to OPENAI_API_KEY).
    #[arg(long, env = "AUTOFIX_TOOL_API_KEY", hide_env_values = true)]
    tool_api_key: Option<String>,

    /// Fix tool deadline in seconds.
    #[arg(long, env = "AUTOFIX_TOOL_TIMEOUT_SECS")]
    tool_timeout_secs: Option<u64>,

    /// Seconds to wait for in-flight runs on shutdown.
    #[arg(long)]
    shutdown_grace_secs: Option<u64>,
}

impl Args {
    /// Applies flag and environment overrides on top of file configuration.
    fn apply(self, mut config: AppConfig) -> AppConfig {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(grace) = self.shutdown_grace_secs {
            config.server.shutdown_grace_secs = grace;
        }
        if let Some(token) = self.token {
            config.github.token = Some(Secret::new(token));
        }
        if let Some(secret) = self.webhook_secret {
            config.github.webhook_secret = Some(Secret::new(secret));
        }
        if let Some(api_url) = self.api_url {
            config.github.api_url = Some(api_url);
        }
        if let Some(binary) = self.tool_binary {
            config.tool.binary = binary;
        }
        if let Some(model) = self.tool_model {
            config.tool.model = model;
        }
        if let Some(key) = self.tool_api_key {
            config.tool.api_key = Some(Secret::new(key));
        }
        if let Some(timeout) = self.tool_timeout_secs {
            config.tool.timeout_secs = timeout;
        }
        config.tool = config.tool.with_env_fallback();
        config
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args = Args::parse();

    match run(args).await {
        Ok(summary) => {
            print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Critical failure");
            ExitCode::from(2)
        }
    }
}

/// Initializes tracing with environment filter support.
///
/// Log level is read from `RUST_LOG` and defaults to `info`.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

/// Main execution logic.
async fn run(args: Args) -> Result<RunSummary, RunnerError> {
    let config = AppConfig::load(args.config.as_deref())?;
    let config = args.apply(config);
    let runner = Runner::new(config)?;
    runner.serve(shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown requested");
}

/// Prints the final run summary.
fn print_summary(summary: &RunSummary) {
    println!("\nSummary:");
    println!("  Runs started: {}", summary.runs_started);
    println!("  Pull requests opened: {}", summary.prs_opened);
    println!("  Ignored by label policy: {}", summary.ignored);
    println!("  Not fixable: {}", summary.not_fixable);
    println!("  No fix found: {}", summary.no_fix_found);
    println!("  Failed: {}", summary.failed);
    println!("  Errored: {}", summary.errored);
    println!("  Cancelled: {}", summary.cancelled);
}
