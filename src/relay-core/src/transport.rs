//! The seam between the router and a chat platform.

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by a [`ChatTransport`].
#[derive(Error, Debug)]
pub enum TransportError {
    /// The platform answered but refused the request.
    #[error("platform rejected request: {0}")]
    Rejected(String),

    /// The request never got an answer.
    #[error("network error: {0}")]
    Network(String),

    /// The answer could not be understood.
    #[error("invalid response payload: {0}")]
    Payload(String),
}

/// Result type for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// How outbound text should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    /// Platform markup (Telegram Markdown, Slack mrkdwn).
    Markup,
    /// Literal text.
    Plain,
}

/// A platform event normalized for the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Platform user id of the author.
    pub sender: String,
    /// Chat or channel the reply goes to.
    pub conversation: String,
    /// Message text.
    pub text: String,
}

impl InboundMessage {
    /// Create a new inbound message.
    pub fn new(
        sender: impl Into<String>,
        conversation: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            conversation: conversation.into(),
            text: text.into(),
        }
    }
}

/// Outbound side of a chat platform.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send `text` to `conversation`.
    ///
    /// Returns a reference to the posted message when the platform provides
    /// one; it can later be passed to [`ChatTransport::delete`].
    async fn send(
        &self,
        conversation: &str,
        text: &str,
        format: TextFormat,
    ) -> TransportResult<Option<String>>;

    /// Delete a previously sent message.
    async fn delete(&self, conversation: &str, message_ref: &str) -> TransportResult<()>;

    /// Largest chunk, in bytes, the platform accepts in one message.
    fn max_message_len(&self) -> usize;

    /// Platform name, used in logs.
    fn name(&self) -> &str;
}
