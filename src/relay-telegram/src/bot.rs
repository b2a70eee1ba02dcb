//! Long-polling adapter loop.
//!
//! # Example
//!
//! ```rust,ignore
//! use relay_telegram::{TelegramBot, TelegramConfig};
//!
//! let bot = TelegramBot::new(TelegramConfig::new(token, allowed_user_id), executor)?;
//! bot.run(shutdown_tx.subscribe()).await?;
//! ```

use std::sync::Arc;

use relay_core::{CommandStyle, Router, Session};
use relay_executor::Executor;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::api::TelegramClient;
use crate::config::TelegramConfig;
use crate::error::TelegramResult;

/// Telegram side of the relay.
pub struct TelegramBot {
    config: TelegramConfig,
    router: Router<TelegramClient>,
}

impl TelegramBot {
    /// Create a bot that forwards the allowed user's messages to `executor`.
    pub fn new(config: TelegramConfig, executor: Arc<dyn Executor>) -> TelegramResult<Self> {
        let client = TelegramClient::new(&config)?;
        let router = Router::new(
            client,
            executor,
            config.allowed_user_id().to_string(),
            CommandStyle::SlashOnly,
        );

        Ok(Self { config, router })
    }

    /// Poll for messages until `shutdown` fires.
    ///
    /// Fails when the token is rejected, at startup or later. Other poll
    /// errors are retried after the configured delay.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> TelegramResult<()> {
        let client = self.router.transport();

        let me = client.get_me().await?;
        info!(
            "[Telegram] Authorized on account {} (using {})",
            me.display_name(),
            self.router.executor().name()
        );
        info!("[Telegram] Bot is running and listening for messages...");

        let mut session = Session::new();
        let mut offset: Option<i64> = None;

        loop {
            let polled = tokio::select! {
                _ = shutdown.recv() => {
                    info!("[Telegram] Received shutdown signal");
                    return Ok(());
                }
                polled = client.get_updates(offset) => polled,
            };

            match polled {
                Ok(updates) => {
                    for update in updates {
                        offset = Some(update.update_id + 1);

                        let Some(message) = update.message else {
                            debug!(
                                "[Telegram] Skipping update {} without a message",
                                update.update_id
                            );
                            continue;
                        };

                        let disposition =
                            self.router.handle(&mut session, message.to_inbound()).await;
                        debug!(
                            "[Telegram] Update {} handled: {:?}",
                            update.update_id, disposition
                        );
                    }
                }
                Err(e) if e.is_fatal() => {
                    error!("[Telegram] Stopping: {}", e);
                    return Err(e);
                }
                Err(e) => {
                    warn!(
                        "[Telegram] Failed to get updates: {}. Retrying in {:?}",
                        e,
                        self.config.retry_delay()
                    );
                    tokio::select! {
                        _ = shutdown.recv() => {
                            info!("[Telegram] Received shutdown signal");
                            return Ok(());
                        }
                        _ = tokio::time::sleep(self.config.retry_delay()) => {}
                    }
                }
            }
        }
    }
}
