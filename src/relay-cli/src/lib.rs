//! Vault Relay process wiring.
//!
//! Builds the configured executor, starts one adapter task per enabled chat
//! platform and supervises them until a shutdown signal arrives or an
//! adapter fails.

pub mod config;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use relay_executor::{Executor, build_executor};
use relay_slack::SlackBot;
use relay_telegram::TelegramBot;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::{Instrument, error, info, info_span, warn};

pub use config::{AppConfig, ConfigError};

/// How long adapters get to finish after shutdown is requested.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Run every enabled adapter until `shutdown` resolves.
///
/// Returns an error as soon as one adapter stops with an error; the others
/// are asked to stop first.
pub async fn run_with_shutdown(
    config: AppConfig,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<()> {
    let executor: Arc<dyn Executor> = build_executor(config.executor, config.executor_config);
    info!("Using {} executor", executor.name());

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let mut adapters: JoinSet<(&'static str, anyhow::Result<()>)> = JoinSet::new();

    if let Some(telegram) = config.telegram {
        let bot = TelegramBot::new(telegram, executor.clone())
            .context("Failed to create Telegram bot")?;
        let rx = shutdown_tx.subscribe();
        info!("Starting Telegram bot...");
        adapters.spawn(
            async move { ("telegram", bot.run(rx).await.map_err(anyhow::Error::from)) }
                .instrument(info_span!("adapter", platform = "telegram")),
        );
    }

    if let Some(slack) = config.slack {
        let bot = SlackBot::new(slack, executor.clone()).context("Failed to create Slack bot")?;
        let rx = shutdown_tx.subscribe();
        info!("Starting Slack bot (Socket Mode)...");
        adapters.spawn(
            async move { ("slack", bot.run(rx).await.map_err(anyhow::Error::from)) }
                .instrument(info_span!("adapter", platform = "slack")),
        );
    }

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                let _ = shutdown_tx.send(());
                drain(&mut adapters).await;
                return Ok(());
            }
            joined = adapters.join_next() => {
                let Some(joined) = joined else {
                    info!("All adapters stopped");
                    return Ok(());
                };
                match joined {
                    Ok((platform, Ok(()))) => {
                        warn!("{} adapter stopped", platform);
                    }
                    Ok((platform, Err(e))) => {
                        let _ = shutdown_tx.send(());
                        drain(&mut adapters).await;
                        return Err(e.context(format!("{} adapter failed", platform)));
                    }
                    Err(e) => {
                        let _ = shutdown_tx.send(());
                        drain(&mut adapters).await;
                        return Err(anyhow::anyhow!("Adapter task panicked: {}", e));
                    }
                }
            }
        }
    }
}

/// Wait up to [`SHUTDOWN_GRACE`] for the remaining adapters.
async fn drain(adapters: &mut JoinSet<(&'static str, anyhow::Result<()>)>) {
    if adapters.is_empty() {
        return;
    }

    info!(
        "Waiting up to {}s for adapters to finish...",
        SHUTDOWN_GRACE.as_secs()
    );

    let wait_all = async {
        while let Some(joined) = adapters.join_next().await {
            match joined {
                Ok((platform, Ok(()))) => info!("{} adapter stopped", platform),
                Ok((platform, Err(e))) => error!("{} adapter failed: {:#}", platform, e),
                Err(e) => error!("Adapter task panicked: {}", e),
            }
        }
    };

    if tokio::time::timeout(SHUTDOWN_GRACE, wait_all).await.is_err() {
        warn!("Adapters did not stop in time, aborting");
        adapters.abort_all();
    }
}
