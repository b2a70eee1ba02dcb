//! Minimal Bot API client.
//!
//! Only the four methods the relay needs are implemented. Every call is a
//! JSON `POST` to `{api_base}/bot{token}/{method}`.

use std::time::Duration;

use async_trait::async_trait;
use relay_core::{ChatTransport, InboundMessage, TextFormat, TransportError, TransportResult};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::TelegramConfig;
use crate::error::{TelegramError, TelegramResult};

/// Longest text `sendMessage` accepts.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Parse mode used for markup sends.
const PARSE_MODE_MARKDOWN: &str = "Markdown";

/// Slack added on top of the long-poll timeout for the HTTP request itself.
const HTTP_TIMEOUT_MARGIN: Duration = Duration::from_secs(30);

/// Envelope of every Bot API response.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
}

/// A Telegram user or bot.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: i64,
    /// Whether this is a bot.
    #[serde(default)]
    pub is_bot: bool,
    /// First name.
    #[serde(default)]
    pub first_name: String,
    /// Username, without the `@`.
    #[serde(default)]
    pub username: Option<String>,
}

impl User {
    /// Username when set, first name otherwise.
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.first_name)
    }
}

/// A chat.
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    /// Unique identifier.
    pub id: i64,
}

/// A message.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    /// Identifier inside the chat.
    pub message_id: i64,
    /// Sender; absent for channel posts.
    #[serde(default)]
    pub from: Option<User>,
    /// Chat the message belongs to.
    pub chat: Chat,
    /// Text, absent for media messages.
    #[serde(default)]
    pub text: Option<String>,
}

impl Message {
    /// Normalize for the router.
    ///
    /// A missing sender becomes an empty id, which never matches the
    /// allowed user.
    pub fn to_inbound(&self) -> InboundMessage {
        InboundMessage::new(
            self.from
                .as_ref()
                .map(|user| user.id.to_string())
                .unwrap_or_default(),
            self.chat.id.to_string(),
            self.text.clone().unwrap_or_default(),
        )
    }
}

/// One entry returned by `getUpdates`.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    /// Monotonic update id.
    pub update_id: i64,
    /// New incoming message, if this update carries one.
    #[serde(default)]
    pub message: Option<Message>,
}

/// HTTP client for the Bot API.
pub struct TelegramClient {
    client: reqwest::Client,
    /// `{api_base}/bot{token}`; never logged.
    method_base: String,
    poll_timeout: Duration,
}

impl TelegramClient {
    /// Create a client for `config`.
    pub fn new(config: &TelegramConfig) -> TelegramResult<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.poll_timeout() + HTTP_TIMEOUT_MARGIN)
            .build()
            .map_err(|e| TelegramError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            method_base: format!("{}/bot{}", config.api_base(), config.token()),
            poll_timeout: config.poll_timeout(),
        })
    }

    /// Call `getMe`; used at startup to check the token.
    pub async fn get_me(&self) -> TelegramResult<User> {
        self.call("getMe", &serde_json::json!({})).await
    }

    /// Long-poll for new messages.
    ///
    /// `offset` is one past the last update already handled.
    pub async fn get_updates(&self, offset: Option<i64>) -> TelegramResult<Vec<Update>> {
        let mut payload = serde_json::json!({
            "timeout": self.poll_timeout.as_secs(),
            "allowed_updates": ["message"],
        });
        if let Some(offset) = offset {
            payload["offset"] = serde_json::json!(offset);
        }

        self.call("getUpdates", &payload).await
    }

    /// Send a text message, optionally with a parse mode.
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<&str>,
    ) -> TelegramResult<Message> {
        let mut payload = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });
        if let Some(parse_mode) = parse_mode {
            payload["parse_mode"] = serde_json::json!(parse_mode);
        }

        self.call("sendMessage", &payload).await
    }

    /// Delete a message.
    pub async fn delete_message(&self, chat_id: i64, message_id: i64) -> TelegramResult<()> {
        let payload = serde_json::json!({
            "chat_id": chat_id,
            "message_id": message_id,
        });

        let _: bool = self.call("deleteMessage", &payload).await?;
        Ok(())
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &serde_json::Value,
    ) -> TelegramResult<T> {
        debug!("Calling Telegram method {}", method);

        let url = format!("{}/{}", self.method_base, method);
        let response = self.client.post(&url).json(payload).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(TelegramError::Auth(format!("{} rejected the bot token", method)));
        }

        let parsed: ApiResponse<T> = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(TelegramError::Api(format!("{}: {}", status, body)));
            }
            Err(e) => return Err(e.into()),
        };

        if !parsed.ok {
            let description = parsed
                .description
                .unwrap_or_else(|| format!("{} failed with {}", method, status));
            return Err(match parsed.error_code {
                Some(401) => TelegramError::Auth(description),
                _ => TelegramError::Api(description),
            });
        }

        parsed
            .result
            .ok_or_else(|| TelegramError::InvalidPayload(format!("{} returned no result", method)))
    }
}

fn parse_id(value: &str, what: &str) -> TelegramResult<i64> {
    value
        .parse()
        .map_err(|_| TelegramError::InvalidPayload(format!("invalid {}: {}", what, value)))
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn send(
        &self,
        conversation: &str,
        text: &str,
        format: TextFormat,
    ) -> TransportResult<Option<String>> {
        let chat_id = parse_id(conversation, "chat id")?;
        let parse_mode = match format {
            TextFormat::Markup => Some(PARSE_MODE_MARKDOWN),
            TextFormat::Plain => None,
        };

        let message = self.send_message(chat_id, text, parse_mode).await?;
        Ok(Some(message.message_id.to_string()))
    }

    async fn delete(&self, conversation: &str, message_ref: &str) -> TransportResult<()> {
        let chat_id = parse_id(conversation, "chat id")?;
        let message_id = parse_id(message_ref, "message id")?;
        self.delete_message(chat_id, message_id)
            .await
            .map_err(TransportError::from)
    }

    fn max_message_len(&self) -> usize {
        MAX_MESSAGE_LEN
    }

    fn name(&self) -> &str {
        "Telegram"
    }
}
