//! Socket Mode adapter loop.
//!
//! The `SlackBot`:
//! - checks the bot token with `auth.test`
//! - opens a Socket Mode WebSocket and acknowledges every envelope
//! - hands direct messages from the allowed user to the router
//! - reconnects when Slack closes or refreshes the connection
//!
//! # Example
//!
//! ```rust,ignore
//! use relay_slack::{SlackBot, SlackConfig};
//!
//! let config = SlackConfig::new(bot_token, app_token, allowed_user_id);
//! let bot = SlackBot::new(config, executor)?;
//! bot.run(shutdown_tx.subscribe()).await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use relay_core::{CommandStyle, Router, Session};
use relay_executor::Executor;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tokio::time::interval;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, warn};

use crate::client::SlackClient;
use crate::config::SlackConfig;
use crate::error::{SlackError, SlackResult};
use crate::events::{EnvelopeAction, SocketModeAck, SocketModeEnvelope, classify_envelope};

/// Type alias for the WebSocket connection.
type WsConnection = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Configuration for bot behavior.
#[derive(Debug, Clone)]
pub struct BotOptions {
    /// Timeout for API requests.
    pub api_timeout: Duration,
    /// Delay between reconnection attempts after an error.
    pub reconnect_delay: Duration,
    /// Ping interval for WebSocket keep-alive.
    pub ping_interval: Duration,
}

impl Default for BotOptions {
    fn default() -> Self {
        Self {
            api_timeout: Duration::from_secs(30),
            reconnect_delay: Duration::from_secs(5),
            ping_interval: Duration::from_secs(30),
        }
    }
}

/// How a Socket Mode connection ended.
#[derive(Debug, PartialEq, Eq)]
enum ConnectionEnd {
    /// Shutdown was requested.
    Shutdown,
    /// Slack closed or refreshed the connection.
    Reconnect,
}

/// Slack side of the relay.
pub struct SlackBot {
    router: Router<SlackClient>,
    options: BotOptions,
}

impl SlackBot {
    /// Create a bot that forwards the allowed user's DMs to `executor`.
    pub fn new(config: SlackConfig, executor: Arc<dyn Executor>) -> SlackResult<Self> {
        Self::with_options(config, executor, BotOptions::default())
    }

    /// Create a new bot with custom options.
    pub fn with_options(
        config: SlackConfig,
        executor: Arc<dyn Executor>,
        options: BotOptions,
    ) -> SlackResult<Self> {
        let allowed_user_id = config.allowed_user_id().to_string();
        let client = SlackClient::new(config, options.api_timeout)?;
        let router = Router::new(client, executor, allowed_user_id, CommandStyle::SlashOrBare);

        Ok(Self { router, options })
    }

    /// Run until `shutdown` fires.
    ///
    /// Fails when authentication fails or the first Socket Mode URL cannot
    /// be obtained. Dropped connections are re-opened; only an auth error
    /// while re-opening is fatal.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> SlackResult<()> {
        let client = self.router.transport();

        let bot_user_id = client.auth_test().await?;
        info!(
            "[Slack] Authenticated as bot user: {} (using {})",
            bot_user_id,
            self.router.executor().name()
        );

        let mut session = Session::new();
        let mut ws_url = client.open_connection().await?;

        loop {
            info!("[Slack] Connecting to Socket Mode...");

            match self
                .connect_and_run(&ws_url, &mut session, &mut shutdown)
                .await
            {
                Ok(ConnectionEnd::Shutdown) => return Ok(()),
                Ok(ConnectionEnd::Reconnect) => {
                    info!("[Slack] Socket Mode connection closed, reconnecting");
                }
                Err(e) => {
                    error!("[Slack] Socket Mode connection error: {}", e);
                    if self
                        .sleep_or_shutdown(self.options.reconnect_delay, &mut shutdown)
                        .await
                    {
                        return Ok(());
                    }
                }
            }

            ws_url = loop {
                match client.open_connection().await {
                    Ok(url) => break url,
                    Err(SlackError::Auth(msg)) => return Err(SlackError::Auth(msg)),
                    Err(e) => {
                        let delay = match &e {
                            SlackError::RateLimited { retry_after_secs } => {
                                Duration::from_secs(*retry_after_secs)
                            }
                            _ => self.options.reconnect_delay,
                        };
                        warn!("[Slack] Failed to open Socket Mode connection: {}", e);
                        if self.sleep_or_shutdown(delay, &mut shutdown).await {
                            return Ok(());
                        }
                    }
                }
            };
        }
    }

    /// Wait `delay`; returns `true` if shutdown was requested meanwhile.
    async fn sleep_or_shutdown(
        &self,
        delay: Duration,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> bool {
        info!("[Slack] Reconnecting in {:?}...", delay);
        tokio::select! {
            _ = shutdown.recv() => {
                info!("[Slack] Received shutdown signal");
                true
            }
            _ = tokio::time::sleep(delay) => false,
        }
    }

    /// Connect to WebSocket and run event loop.
    async fn connect_and_run(
        &self,
        ws_url: &str,
        session: &mut Session,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> SlackResult<ConnectionEnd> {
        let (ws_stream, _) = connect_async(ws_url).await?;
        let (mut write, read) = ws_stream.split();

        // Channel for outgoing messages
        let (msg_tx, mut msg_rx) = mpsc::channel::<WsMessage>(100);

        // Spawn write task
        let write_task = tokio::spawn(async move {
            while let Some(msg) = msg_rx.recv().await {
                if let Err(e) = write.send(msg).await {
                    error!("[Slack] Failed to send WebSocket message: {}", e);
                    break;
                }
            }
        });

        // Spawn ping task
        let ping_tx = msg_tx.clone();
        let ping_interval = self.options.ping_interval;
        let ping_task = tokio::spawn(async move {
            let mut interval = interval(ping_interval);
            loop {
                interval.tick().await;
                if ping_tx.send(WsMessage::Ping(vec![])).await.is_err() {
                    break;
                }
            }
        });

        // Process incoming messages
        let result = self
            .process_messages(read, &msg_tx, session, shutdown)
            .await;

        // Cleanup
        ping_task.abort();
        write_task.abort();

        result
    }

    /// Process incoming WebSocket messages.
    async fn process_messages(
        &self,
        mut read: SplitStream<WsConnection>,
        msg_tx: &mpsc::Sender<WsMessage>,
        session: &mut Session,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> SlackResult<ConnectionEnd> {
        loop {
            let msg = tokio::select! {
                _ = shutdown.recv() => {
                    info!("[Slack] Received shutdown signal");
                    return Ok(ConnectionEnd::Shutdown);
                }
                msg = read.next() => msg,
            };

            match msg {
                Some(Ok(WsMessage::Text(text))) => {
                    if let Some(end) = self.handle_socket_message(&text, msg_tx, session).await {
                        return Ok(end);
                    }
                }
                Some(Ok(WsMessage::Ping(data))) => {
                    let _ = msg_tx.send(WsMessage::Pong(data)).await;
                }
                Some(Ok(WsMessage::Close(_))) => {
                    info!("[Slack] WebSocket closed by server");
                    return Ok(ConnectionEnd::Reconnect);
                }
                Some(Err(e)) => {
                    return Err(SlackError::WebSocket(e.to_string()));
                }
                None => {
                    return Ok(ConnectionEnd::Reconnect);
                }
                // Pong and binary frames carry nothing for us
                Some(Ok(_)) => {}
            }
        }
    }

    /// Handle a Socket Mode message.
    async fn handle_socket_message(
        &self,
        text: &str,
        msg_tx: &mpsc::Sender<WsMessage>,
        session: &mut Session,
    ) -> Option<ConnectionEnd> {
        debug!("[Slack] Received Socket Mode message: {}", text);

        let envelope: SocketModeEnvelope = match serde_json::from_str(text) {
            Ok(env) => env,
            Err(e) => {
                warn!("[Slack] Failed to parse Socket Mode envelope: {}", e);
                return None;
            }
        };

        // Always acknowledge first
        if let Some(envelope_id) = &envelope.envelope_id {
            match serde_json::to_string(&SocketModeAck::new(envelope_id)) {
                Ok(ack) => {
                    let _ = msg_tx.send(WsMessage::Text(ack)).await;
                }
                Err(e) => warn!("[Slack] Failed to encode acknowledgment: {}", e),
            }
        }

        match classify_envelope(&envelope) {
            Ok(EnvelopeAction::Relay(inbound)) => {
                let disposition = self.router.handle(session, inbound).await;
                debug!("[Slack] Message handled: {:?}", disposition);
                None
            }
            Ok(EnvelopeAction::Reconnect) => {
                info!(
                    "[Slack] Received disconnect request from Slack ({})",
                    envelope.reason.as_deref().unwrap_or("no reason")
                );
                Some(ConnectionEnd::Reconnect)
            }
            Ok(EnvelopeAction::Ignore) => {
                if envelope.envelope_type == "hello" {
                    info!("[Slack] Socket Mode connection established");
                    info!("[Slack] Bot is running and listening for messages...");
                } else {
                    debug!("[Slack] Ignoring envelope type: {}", envelope.envelope_type);
                }
                None
            }
            Err(e) => {
                warn!("[Slack] Failed to parse event: {}", e);
                None
            }
        }
    }
}
