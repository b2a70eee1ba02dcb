//! Platform-independent relay logic for Vault Relay.
//!
//! A chat adapter owns one [`Session`] and one [`Router`]. Every inbound
//! event is normalized into an [`InboundMessage`] and handed to
//! [`Router::handle`], which checks authorization, intercepts commands,
//! runs the executor and sends the reply back through the adapter's
//! [`ChatTransport`].
//!
//! Long replies are split by [`chunk_response`] and sent by [`deliver`],
//! which falls back to plain text when the platform rejects markup.

mod chunker;
mod commands;
mod router;
mod session;
#[cfg(test)]
mod testing;
mod transport;

pub use chunker::{SEND_FAILURE_PREFIX, chunk_response, deliver};
pub use commands::{Command, CommandStyle};
pub use router::{
    Disposition, NO_SESSION_MESSAGE, PROCESSING_MESSAGE, RESET_MESSAGE, Router,
    START_DAY_MESSAGE,
};
pub use session::Session;
pub use transport::{ChatTransport, InboundMessage, TextFormat, TransportError, TransportResult};
