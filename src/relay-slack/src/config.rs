//! Configuration for Slack integration.

use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

use crate::error::{SlackError, SlackResult};

/// Public Web API endpoint.
pub const DEFAULT_API_BASE: &str = "https://slack.com/api";

/// Configuration for Slack integration.
#[derive(Clone)]
pub struct SlackConfig {
    /// Bot OAuth token (xoxb-...).
    bot_token: SecretString,
    /// App-level token for Socket Mode (xapp-...).
    app_token: SecretString,
    /// Member id of the only user the bot answers.
    allowed_user_id: String,
    /// Web API base URL, without a trailing slash.
    api_base: String,
}

impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field("bot_token", &"[REDACTED]")
            .field("app_token", &"[REDACTED]")
            .field("allowed_user_id", &self.allowed_user_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl SlackConfig {
    /// Create a new configuration with required tokens.
    pub fn new(
        bot_token: impl Into<String>,
        app_token: impl Into<String>,
        allowed_user_id: impl Into<String>,
    ) -> Self {
        let config = Self {
            bot_token: SecretString::new(bot_token.into().into()),
            app_token: SecretString::new(app_token.into().into()),
            allowed_user_id: allowed_user_id.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        };

        // Validate token formats
        if !config.bot_token().starts_with("xoxb-") {
            warn!("Bot token doesn't start with 'xoxb-', this may be incorrect");
        }
        if !config.app_token().starts_with("xapp-") {
            warn!("App token doesn't start with 'xapp-', this may be incorrect");
        }

        config
    }

    /// Use another Web API base URL.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Get the bot token.
    pub fn bot_token(&self) -> &str {
        self.bot_token.expose_secret()
    }

    /// Get the app token for Socket Mode.
    pub fn app_token(&self) -> &str {
        self.app_token.expose_secret()
    }

    /// Get the allowed user id.
    pub fn allowed_user_id(&self) -> &str {
        &self.allowed_user_id
    }

    /// Get the Web API base URL.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Validate the configuration.
    pub fn validate(&self) -> SlackResult<()> {
        if self.bot_token.expose_secret().is_empty() {
            return Err(SlackError::Config("Bot token is empty".to_string()));
        }
        if self.app_token.expose_secret().is_empty() {
            return Err(SlackError::Config("App token is empty".to_string()));
        }
        if self.allowed_user_id.is_empty() {
            return Err(SlackError::Config("Allowed user id is empty".to_string()));
        }
        Ok(())
    }
}
