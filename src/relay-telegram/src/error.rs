//! Error types for the Telegram adapter.

use relay_core::TransportError;
use thiserror::Error;

/// Errors that can occur while talking to the Bot API.
#[derive(Error, Debug)]
pub enum TelegramError {
    /// Configuration error (missing or invalid config).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The bot token was rejected.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The Bot API answered `ok: false`.
    #[error("Telegram API error: {0}")]
    Api(String),

    /// Network/HTTP error.
    #[error("Network error: {0}")]
    Network(String),

    /// Operation timed out.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// A value the API returned could not be used.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

impl TelegramError {
    /// Whether polling should stop instead of retrying.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TelegramError::Auth(_) | TelegramError::Config(_))
    }
}

impl From<reqwest::Error> for TelegramError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL embeds the bot token.
        let err = err.without_url();
        if err.is_timeout() {
            TelegramError::Timeout(err.to_string())
        } else if err.is_connect() {
            TelegramError::Network(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            TelegramError::Json(err.to_string())
        } else {
            TelegramError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for TelegramError {
    fn from(err: serde_json::Error) -> Self {
        TelegramError::Json(err.to_string())
    }
}

impl From<TelegramError> for TransportError {
    fn from(err: TelegramError) -> Self {
        match err {
            TelegramError::Network(_) | TelegramError::Timeout(_) => {
                TransportError::Network(err.to_string())
            }
            TelegramError::Json(_) | TelegramError::InvalidPayload(_) => {
                TransportError::Payload(err.to_string())
            }
            TelegramError::Config(_) | TelegramError::Auth(_) | TelegramError::Api(_) => {
                TransportError::Rejected(err.to_string())
            }
        }
    }
}

/// Result type for Telegram operations.
pub type TelegramResult<T> = std::result::Result<T, TelegramError>;
