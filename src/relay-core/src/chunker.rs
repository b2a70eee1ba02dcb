//! Splitting and sending long responses.

use tracing::{debug, error, warn};

use crate::transport::{ChatTransport, TextFormat};

/// Prefix of the notice sent when a chunk cannot be delivered at all.
pub const SEND_FAILURE_PREFIX: &str = "❌ Failed to send response: ";

/// Split `text` into pieces of at most `max_len` bytes.
///
/// A piece ends just before the last newline in its window, so the newline
/// opens the next piece, unless that newline sits in the first half of the
/// window; then the piece is cut at the limit instead. Cuts never split a
/// character, and every piece holds at least one character even when
/// `max_len` is smaller than it.
///
/// The pieces concatenate back to `text`. Empty input gives no pieces.
pub fn chunk_response(text: &str, max_len: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        if rest.len() <= max_len {
            chunks.push(rest);
            break;
        }

        let cut = match rest.as_bytes()[..max_len]
            .iter()
            .rposition(|&b| b == b'\n')
        {
            Some(idx) if idx > 0 && idx >= max_len / 2 => idx,
            _ => hard_cut(rest, max_len),
        };

        let (head, tail) = rest.split_at(cut);
        chunks.push(head);
        rest = tail;
    }

    chunks
}

/// Largest char boundary at or below `max_len`, but never zero.
fn hard_cut(text: &str, max_len: usize) -> usize {
    let mut cut = max_len;
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }
    if cut == 0 {
        cut = text.chars().next().map_or(text.len(), char::len_utf8);
    }
    cut
}

/// Send `response` to `conversation` in chunks.
///
/// Each chunk goes out as markup first and as plain text if the platform
/// rejects it. When both fail, a short notice is attempted and the rest of
/// the response is dropped.
pub async fn deliver<T>(transport: &T, conversation: &str, response: &str)
where
    T: ChatTransport + ?Sized,
{
    let chunks = chunk_response(response, transport.max_message_len());
    debug!(
        "Delivering {} bytes in {} chunk(s) via {}",
        response.len(),
        chunks.len(),
        transport.name()
    );

    for chunk in chunks {
        let markup = transport.send(conversation, chunk, TextFormat::Markup).await;
        let Err(markup_err) = markup else {
            continue;
        };

        warn!(
            "[{}] Failed to send with markup, retrying as plain text: {}",
            transport.name(),
            markup_err
        );

        if let Err(e) = transport.send(conversation, chunk, TextFormat::Plain).await {
            error!("[{}] Failed to send response: {}", transport.name(), e);
            let notice = format!("{}{}", SEND_FAILURE_PREFIX, e);
            if let Err(e) = transport.send(conversation, &notice, TextFormat::Plain).await {
                error!("[{}] Failed to send failure notice: {}", transport.name(), e);
            }
            return;
        }
    }
}
