//! Slack adapter for Vault Relay.
//!
//! Uses Socket Mode, so no public HTTP endpoint is needed: the app token
//! opens a WebSocket, the bot token posts and deletes messages. Only direct
//! messages from the configured user are relayed.
//!
//! # Configuration
//!
//! - `SLACK_BOT_TOKEN` - Bot OAuth token (xoxb-...)
//! - `SLACK_APP_TOKEN` - App-level token for Socket Mode (xapp-...)
//! - `ALLOWED_SLACK_USER_ID` - member id of the only user served
//!
//! # Required Slack App Settings
//!
//! 1. Enable Socket Mode
//! 2. Subscribe to the `message.im` bot event
//! 3. Add the `chat:write` and `im:history` scopes

pub mod bot;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod messages;

pub use bot::{BotOptions, SlackBot};
pub use client::{MAX_MESSAGE_LEN, SlackClient};
pub use config::{DEFAULT_API_BASE, SlackConfig};
pub use error::{SlackApiError, SlackError, SlackResult};
pub use events::{EnvelopeAction, MessageEvent, SlackEvent, SocketModeAck, SocketModeEnvelope};
pub use messages::{SlackMessageContent, markdown_to_mrkdwn};
