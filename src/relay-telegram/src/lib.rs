//! Telegram adapter for Vault Relay.
//!
//! Talks to the Bot API directly over HTTPS: `getMe` once at startup, then
//! `getUpdates` long polling. Replies go out through `sendMessage` with
//! Markdown, falling back to plain text when Telegram cannot parse it.
//!
//! # Configuration
//!
//! - `TELEGRAM_TOKEN` - bot token
//! - `ALLOWED_TELEGRAM_USER_ID` - numeric id of the only user served
//! - `TELEGRAM_API_BASE` - optional Bot API base URL

pub mod api;
pub mod bot;
pub mod config;
pub mod error;

pub use api::{MAX_MESSAGE_LEN, TelegramClient};
pub use bot::TelegramBot;
pub use config::{DEFAULT_API_BASE, TelegramConfig};
pub use error::{TelegramError, TelegramResult};
