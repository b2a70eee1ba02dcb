//! Message formatting for Slack.
//!
//! Provides utilities for:
//! - Converting Markdown to Slack's mrkdwn format
//! - Building `chat.postMessage` payloads with Block Kit

use serde::{Deserialize, Serialize};

/// Convert Markdown to Slack mrkdwn format.
///
/// Slack uses a custom markup format called "mrkdwn" which differs from
/// standard Markdown:
/// - Bold: `**text**` -> `*text*`
/// - Italic: `_text_` stays the same
/// - Strikethrough: `~~text~~` -> `~text~`
/// - Code stays the same
/// - Links: `[text](url)` -> `<url|text>`
///
/// The output is never longer than the input.
///
/// # Example
///
/// ```rust
/// use relay_slack::markdown_to_mrkdwn;
///
/// let md = "**bold** and _italic_ with a [link](https://example.com)";
/// let mrkdwn = markdown_to_mrkdwn(md);
/// assert_eq!(mrkdwn, "*bold* and _italic_ with a <https://example.com|link>");
/// ```
pub fn markdown_to_mrkdwn(md: &str) -> String {
    let mut processed = String::with_capacity(md.len());
    let mut in_code_block = false;
    let mut i = 0;

    while i < md.len() {
        let remaining = &md[i..];

        if remaining.starts_with("```") {
            in_code_block = !in_code_block;
            processed.push_str("```");
            i += 3;
            continue;
        }

        if !in_code_block {
            if let Some((converted, consumed)) = convert_inline(remaining) {
                processed.push_str(&converted);
                i += consumed;
                continue;
            }
        }

        // No special handling, copy one character
        let Some(c) = remaining.chars().next() else {
            break;
        };
        processed.push(c);
        i += c.len_utf8();
    }

    processed
}

/// Try the inline rules at the start of `text`.
///
/// Returns the replacement and how many bytes of `text` it covers.
fn convert_inline(text: &str) -> Option<(String, usize)> {
    // Inline code is copied untouched
    if let Some(rest) = text.strip_prefix('`') {
        let end = rest.find('`')?;
        return Some((text[..end + 2].to_string(), end + 2));
    }

    for (marker, replacement) in [("**", '*'), ("~~", '~')] {
        let Some(rest) = text.strip_prefix(marker) else {
            continue;
        };
        let Some(end) = rest.find(marker) else {
            continue;
        };
        if end == 0 {
            continue;
        }
        let converted = format!("{replacement}{}{replacement}", &rest[..end]);
        return Some((converted, end + 2 * marker.len()));
    }

    if let Some(rest) = text.strip_prefix('[') {
        let label_end = rest.find("](")?;
        let label = &rest[..label_end];
        if label.contains(['\n', '[']) {
            return None;
        }
        let url_start = label_end + 2;
        let url_len = rest[url_start..].find(')')?;
        let url = &rest[url_start..url_start + url_len];
        if url.contains(char::is_whitespace) {
            return None;
        }
        return Some((format!("<{}|{}>", url, label), 1 + url_start + url_len + 1));
    }

    None
}

/// Slack text object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackTextObject {
    #[serde(rename = "type")]
    pub text_type: String,
    pub text: String,
}

impl SlackTextObject {
    /// Create a mrkdwn text object.
    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self {
            text_type: "mrkdwn".to_string(),
            text: text.into(),
        }
    }
}

/// Slack Block Kit block types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlackBlock {
    /// Section block (main content).
    Section { text: SlackTextObject },
}

/// Slack message content with blocks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlackMessageContent {
    /// Message text; the notification fallback when blocks are present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Block Kit blocks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Vec<SlackBlock>>,
}

impl SlackMessageContent {
    /// Create a new message content.
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain text only.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new().with_text(text)
    }

    /// A mrkdwn section block with the original text as fallback.
    pub fn markup(text: &str) -> Self {
        Self::new()
            .with_text(text)
            .with_blocks(vec![SlackBlock::Section {
                text: SlackTextObject::mrkdwn(markdown_to_mrkdwn(text)),
            }])
    }

    /// Set fallback text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set blocks.
    pub fn with_blocks(mut self, blocks: Vec<SlackBlock>) -> Self {
        self.blocks = Some(blocks);
        self
    }
}
