//! Vault Relay - chat bots that drive an AI CLI over an Obsidian vault.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use relay_cli::{AppConfig, SHUTDOWN_GRACE, run_with_shutdown};

/// Vault Relay
#[derive(Parser)]
#[command(name = "vault-relay")]
#[command(about = "Relay Telegram and Slack messages to Claude or Gemini CLI")]
#[command(version)]
struct Args {
    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    json_logs: bool,

    /// Environment file to load before reading configuration
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,
}

fn setup_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown (timeout: {}s)...", SHUTDOWN_GRACE.as_secs());
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown (timeout: {}s)...", SHUTDOWN_GRACE.as_secs());
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Load before logging so RUST_LOG from the file is honored
    let env_file = dotenvy::from_path(&args.env_file);

    setup_logging(&args.log_level, args.json_logs);

    match env_file {
        Ok(()) => info!("Loaded environment from {}", args.env_file.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Failed to load {}: {}", args.env_file.display(), e),
    }

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config from environment: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!(
        "Starting Vault Relay with {} executor (model: {})",
        config.executor,
        config.executor_config.model()
    );
    info!("Press Ctrl+C to stop");

    if let Err(e) = run_with_shutdown(config, shutdown_signal()).await {
        error!("Relay error: {:#}", e);
        return ExitCode::FAILURE;
    }

    info!("Relay stopped");
    ExitCode::SUCCESS
}
