//! Configuration for the Telegram adapter.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::error::{TelegramError, TelegramResult};

/// Public Bot API endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Configuration for the Telegram adapter.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    token: SecretString,
    /// The only user the bot answers.
    allowed_user_id: i64,
    /// Bot API base URL, without a trailing slash.
    api_base: String,
    /// Long-poll timeout passed to `getUpdates`.
    poll_timeout: Duration,
    /// Pause after a failed poll.
    retry_delay: Duration,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("allowed_user_id", &self.allowed_user_id)
            .field("api_base", &self.api_base)
            .field("poll_timeout", &self.poll_timeout)
            .field("retry_delay", &self.retry_delay)
            .finish()
    }
}

impl TelegramConfig {
    /// Create a new configuration against the public Bot API.
    pub fn new(token: impl Into<String>, allowed_user_id: i64) -> Self {
        Self {
            token: SecretString::new(token.into().into()),
            allowed_user_id,
            api_base: DEFAULT_API_BASE.to_string(),
            poll_timeout: Duration::from_secs(60),
            retry_delay: Duration::from_secs(5),
        }
    }

    /// Use another Bot API server (a local `telegram-bot-api`, or a mock).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the long-poll timeout.
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Set the pause after a failed poll.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Get the bot token.
    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }

    /// Get the allowed user id.
    pub fn allowed_user_id(&self) -> i64 {
        self.allowed_user_id
    }

    /// Get the API base URL.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Get the long-poll timeout.
    pub fn poll_timeout(&self) -> Duration {
        self.poll_timeout
    }

    /// Get the retry delay.
    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    /// Validate the configuration.
    pub fn validate(&self) -> TelegramResult<()> {
        if self.token.expose_secret().is_empty() {
            return Err(TelegramError::Config("Bot token is empty".to_string()));
        }
        if self.api_base.is_empty() {
            return Err(TelegramError::Config("API base URL is empty".to_string()));
        }
        Ok(())
    }
}
