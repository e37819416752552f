//! Conversation titles
//!
//! A title is requested from the relay after the first exchange of a
//! conversation; the streamed answer is cleaned up here before use.

use crate::llm::Message;
use crate::relay::RelayRequest;

/// Title of a conversation nobody has named yet
pub const DEFAULT_TITLE: &str = "New Chat";

const MAX_TITLE_WORDS: usize = 6;
const MAX_TITLE_LENGTH: usize = 60;

pub fn is_default_title(title: &str) -> bool {
    title == DEFAULT_TITLE
}

/// Relay request asking for a title for `user_message`
pub fn title_request(user_message: &str, model: &str) -> RelayRequest {
    RelayRequest {
        messages: vec![Message::user(user_message)],
        model: model.to_string(),
        text_style: None,
        is_for_title: true,
    }
}

/// Clean up a generated title.
///
/// Drops a leading `<think>` block, surrounding quotes and a `Title:` label,
/// collapses whitespace and caps the result at six words. Returns `None`
/// when nothing usable is left.
pub fn normalize_title(raw: &str) -> Option<String> {
    let text = strip_think_block(raw);
    let text = text.trim();
    let text = text
        .strip_prefix("Title:")
        .or_else(|| text.strip_prefix("title:"))
        .unwrap_or(text)
        .trim();
    let text = text.trim_matches(|c: char| {
        matches!(c, '"' | '\'' | '*' | '`' | '\u{201c}' | '\u{201d}')
    });

    let words: Vec<&str> = text.split_whitespace().take(MAX_TITLE_WORDS).collect();
    if words.is_empty() {
        return None;
    }

    let mut title = words.join(" ");
    if title.chars().count() > MAX_TITLE_LENGTH {
        let capped: String = title.chars().take(MAX_TITLE_LENGTH).collect();
        title = capped.trim_end().to_string();
    }
    Some(title)
}

fn strip_think_block(raw: &str) -> &str {
    match raw.split_once("</think>") {
        Some((head, tail)) if head.contains("<think>") => tail,
        Some(_) => raw,
        // Still thinking when the token budget ran out
        None if raw.contains("<think>") => "",
        None => raw,
    }
}
