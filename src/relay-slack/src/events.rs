//! Socket Mode envelopes and the events carried in them.
//!
//! Only direct messages from people reach the relay; everything else is
//! acknowledged and dropped.

use relay_core::InboundMessage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SlackError, SlackResult};

/// Slack event types that we handle.
#[derive(Debug, Clone)]
pub enum SlackEvent {
    /// Message event.
    Message(MessageEvent),
    /// Any other event type.
    Unknown,
}

/// Event payload for messages.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageEvent {
    /// User who sent the message.
    pub user: Option<String>,
    /// Text of the message.
    #[serde(default)]
    pub text: String,
    /// Channel where the message was sent.
    pub channel: String,
    /// Channel type (im, channel, group, mpim).
    pub channel_type: Option<String>,
    /// Timestamp of the message.
    #[serde(default)]
    pub ts: String,
    /// Subtype of message (e.g., "bot_message", "message_changed").
    pub subtype: Option<String>,
    /// Bot ID (if message is from a bot).
    pub bot_id: Option<String>,
}

impl MessageEvent {
    /// Check if this is a direct message.
    pub fn is_direct_message(&self) -> bool {
        self.channel_type.as_deref() == Some("im")
    }

    /// Check if this is a bot message (should be ignored).
    pub fn is_bot_message(&self) -> bool {
        self.bot_id.is_some()
    }

    /// Normalize for the router.
    ///
    /// Returns `None` unless this is a plain direct message written by a
    /// person: edits, deletions, joins and the bot's own posts all carry a
    /// subtype or a bot id.
    pub fn to_inbound(&self) -> Option<InboundMessage> {
        if !self.is_direct_message() || self.is_bot_message() || self.subtype.is_some() {
            return None;
        }
        let user = self.user.as_deref()?;

        Some(InboundMessage::new(user, &self.channel, &self.text))
    }
}

/// Socket Mode envelope wrapping events.
#[derive(Debug, Clone, Deserialize)]
pub struct SocketModeEnvelope {
    /// Envelope ID for acknowledgment. Absent on `hello` and `disconnect`.
    #[serde(default)]
    pub envelope_id: Option<String>,
    /// Type of payload.
    #[serde(rename = "type")]
    pub envelope_type: String,
    /// Actual payload.
    pub payload: Option<EventPayload>,
    /// Reason given with `disconnect` envelopes.
    pub reason: Option<String>,
}

/// Event callback payload.
#[derive(Debug, Clone, Deserialize)]
pub struct EventPayload {
    /// The actual event.
    pub event: Option<serde_json::Value>,
}

/// Socket Mode acknowledgment response.
#[derive(Debug, Clone, Serialize)]
pub struct SocketModeAck {
    /// Envelope ID being acknowledged.
    pub envelope_id: String,
}

impl SocketModeAck {
    /// Create a simple acknowledgment.
    pub fn new(envelope_id: impl Into<String>) -> Self {
        Self {
            envelope_id: envelope_id.into(),
        }
    }
}

/// What the bot should do with an envelope once it is acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeAction {
    /// Hand the message to the router.
    Relay(InboundMessage),
    /// Slack is about to close this connection; open a new one.
    Reconnect,
    /// Nothing to do.
    Ignore,
}

/// Parse a raw event from the Socket Mode envelope.
pub fn parse_event(payload: &EventPayload) -> SlackResult<SlackEvent> {
    let event_json = payload
        .event
        .as_ref()
        .ok_or_else(|| SlackError::InvalidPayload("Missing event field".to_string()))?;

    // Get event type
    let event_type = event_json
        .get("type")
        .and_then(|t| t.as_str())
        .unwrap_or("unknown");

    debug!("Parsing event type: {}", event_type);

    match event_type {
        "message" => {
            let event: MessageEvent = serde_json::from_value(event_json.clone())?;
            Ok(SlackEvent::Message(event))
        }
        _ => Ok(SlackEvent::Unknown),
    }
}

/// Decide what to do with an envelope.
pub fn classify_envelope(envelope: &SocketModeEnvelope) -> SlackResult<EnvelopeAction> {
    match envelope.envelope_type.as_str() {
        "events_api" => {
            let Some(payload) = &envelope.payload else {
                return Ok(EnvelopeAction::Ignore);
            };
            match parse_event(payload)? {
                SlackEvent::Message(event) => Ok(event
                    .to_inbound()
                    .map_or(EnvelopeAction::Ignore, EnvelopeAction::Relay)),
                SlackEvent::Unknown => Ok(EnvelopeAction::Ignore),
            }
        }
        "disconnect" => Ok(EnvelopeAction::Reconnect),
        _ => Ok(EnvelopeAction::Ignore),
    }
}
