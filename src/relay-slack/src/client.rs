//! Slack Web API client.

use std::time::Duration;

use async_trait::async_trait;
use relay_core::{ChatTransport, TextFormat, TransportResult};
use tracing::debug;

use crate::config::SlackConfig;
use crate::error::{SlackApiError, SlackError, SlackResult};
use crate::messages::SlackMessageContent;

/// Section block text limit.
pub const MAX_MESSAGE_LEN: usize = 3000;

/// HTTP client for the Web API calls the relay makes.
pub struct SlackClient {
    config: SlackConfig,
    client: reqwest::Client,
}

impl SlackClient {
    /// Create a client for `config`.
    pub fn new(config: SlackConfig, api_timeout: Duration) -> SlackResult<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(api_timeout)
            .build()
            .map_err(|e| SlackError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Get the configuration.
    pub fn config(&self) -> &SlackConfig {
        &self.config
    }

    /// Check the bot token; returns the bot's user id.
    pub async fn auth_test(&self) -> SlackResult<String> {
        debug!("Testing Slack authentication...");

        let response = self
            .api_call("auth.test", self.config.bot_token(), &serde_json::json!({}))
            .await
            .map_err(|e| match e {
                SlackError::Api(msg) => SlackError::Auth(msg),
                other => other,
            })?;

        response
            .get("user_id")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| SlackError::InvalidPayload("Missing user_id in auth.test".to_string()))
    }

    /// Get the WebSocket URL for Socket Mode.
    pub async fn open_connection(&self) -> SlackResult<String> {
        let response = self
            .api_call(
                "apps.connections.open",
                self.config.app_token(),
                &serde_json::json!({}),
            )
            .await?;

        response
            .get("url")
            .and_then(|u| u.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| SlackError::Api("Missing url in response".to_string()))
    }

    /// Send a message to a channel; returns its timestamp.
    pub async fn post_message(
        &self,
        channel: &str,
        content: SlackMessageContent,
    ) -> SlackResult<String> {
        let mut payload = serde_json::json!({
            "channel": channel,
        });

        if let Some(text) = &content.text {
            payload["text"] = serde_json::json!(text);
        }
        if let Some(blocks) = &content.blocks {
            payload["blocks"] = serde_json::to_value(blocks)?;
        }

        let response = self
            .api_call("chat.postMessage", self.config.bot_token(), &payload)
            .await?;

        response
            .get("ts")
            .and_then(|ts| ts.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| SlackError::InvalidPayload("Missing ts in response".to_string()))
    }

    /// Delete a message by timestamp.
    pub async fn delete_message(&self, channel: &str, ts: &str) -> SlackResult<()> {
        let payload = serde_json::json!({
            "channel": channel,
            "ts": ts,
        });

        self.api_call("chat.delete", self.config.bot_token(), &payload)
            .await?;
        Ok(())
    }

    /// Make an API call to Slack and check its `ok` flag.
    async fn api_call(
        &self,
        method: &str,
        token: &str,
        payload: &serde_json::Value,
    ) -> SlackResult<serde_json::Value> {
        let url = format!("{}/{}", self.config.api_base(), method);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", "application/json; charset=utf-8")
            .json(payload)
            .send()
            .await?;

        // Check for rate limiting
        if response.status() == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(30);
            return Err(SlackError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SlackError::Api(format!("{}: {}", status, body)));
        }

        let json: serde_json::Value = response.json().await?;

        if json.get("ok").and_then(|v| v.as_bool()) != Some(true) {
            return Err(SlackApiError::from_response(method, &json).into());
        }

        Ok(json)
    }
}

#[async_trait]
impl ChatTransport for SlackClient {
    async fn send(
        &self,
        conversation: &str,
        text: &str,
        format: TextFormat,
    ) -> TransportResult<Option<String>> {
        let content = match format {
            TextFormat::Markup => SlackMessageContent::markup(text),
            TextFormat::Plain => SlackMessageContent::plain(text),
        };

        let ts = self.post_message(conversation, content).await?;
        Ok(Some(ts))
    }

    async fn delete(&self, conversation: &str, message_ref: &str) -> TransportResult<()> {
        self.delete_message(conversation, message_ref).await?;
        Ok(())
    }

    fn max_message_len(&self) -> usize {
        MAX_MESSAGE_LEN
    }

    fn name(&self) -> &str {
        "Slack"
    }
}
