//! Bookmark records and deep links
//!
//! A [`Bookmark`] is the persisted reference to one message. This module also
//! owns the two URL shapes the rest of the crate relies on: the conversation
//! base URL (origin + path) and the deep link that carries a bookmark id in
//! the URL fragment.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::snippet::snippet;

/// Fragment key that marks a deep link.
pub const DEEP_LINK_KEY: &str = "gpt-saver";

/// Prefix of every generated bookmark id.
pub const ID_PREFIX: &str = "bm-";

const ID_SUFFIX_LEN: usize = 6;

/// A saved reference to one message in a conversation
///
/// Serialized with camelCase keys so records written by any host share the
/// same persisted shape.
///
/// # Examples
///
/// ```
/// use gpt_saver::bookmark::Bookmark;
///
/// let bm = Bookmark::capture("https://chatgpt.com/c/42?model=x#top", 3, "  Hello\n world ");
/// assert_eq!(bm.conversation_url, "https://chatgpt.com/c/42");
/// assert_eq!(bm.text_snippet, "Hello world");
/// assert_eq!(bm.index, 3);
/// assert!(bm.id.starts_with("bm-"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    /// Generated id, the only external reference to the record
    pub id: String,
    /// Origin + path of the conversation page at save time
    pub conversation_url: String,
    /// Position among the user messages at save time (fallback only)
    pub index: i64,
    /// Normalized text fingerprint of the message
    pub text_snippet: String,
    /// Epoch milliseconds at save time
    pub created_at: i64,
}

impl Bookmark {
    /// Build a bookmark for a message that is on screen right now.
    ///
    /// # Arguments
    ///
    /// * `page_url` - Full URL of the page; query and fragment are dropped
    /// * `index` - Position of the message among the user messages found
    /// * `text` - Visible text of the message
    pub fn capture(page_url: &str, index: usize, text: &str) -> Self {
        Self {
            id: generate_id(),
            conversation_url: conversation_base(page_url),
            index: i64::try_from(index).unwrap_or(i64::MAX),
            text_snippet: snippet(text),
            created_at: Utc::now().timestamp_millis(),
        }
    }

    /// Stored index as a position, if it can be one.
    pub fn position(&self) -> Option<usize> {
        usize::try_from(self.index).ok()
    }

    /// Deep link that reopens this bookmark.
    pub fn deep_link(&self) -> String {
        deep_link(&self.conversation_url, &self.id)
    }
}

/// Generate a bookmark id: `bm-<epoch-ms base36>-<6 random base36 chars>`.
///
/// Collisions are not checked; time plus random suffix makes them
/// improbable, which is accepted.
pub fn generate_id() -> String {
    let millis = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
    let mut rng = rand::rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| base36_digit(rng.random_range(0..36)))
        .collect();
    format!("{}{}-{}", ID_PREFIX, to_base36(millis), suffix)
}

fn base36_digit(value: u32) -> char {
    std::char::from_digit(value, 36).unwrap_or('0')
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(base36_digit((value % 36) as u32));
        value /= 36;
    }
    digits.iter().rev().collect()
}

/// Origin + path of a URL, with query and fragment removed.
///
/// Unparseable input falls back to cutting at the first `#` and then the
/// first `?`.
pub fn conversation_base(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => format!("{}{}", parsed.origin().ascii_serialization(), parsed.path()),
        Err(_) => {
            let without_fragment = url.split('#').next().unwrap_or_default();
            without_fragment
                .split('?')
                .next()
                .unwrap_or_default()
                .to_string()
        }
    }
}

/// Build `<conversation url without fragment>#gpt-saver=<encoded id>`.
pub fn deep_link(conversation_url: &str, id: &str) -> String {
    let base = conversation_url.split('#').next().unwrap_or_default();
    format!("{}#{}={}", base, DEEP_LINK_KEY, encode_component(id))
}

/// Extract the bookmark id from a page URL carrying a deep-link fragment.
///
/// Accepts either a full URL or a bare `#...` fragment. The value runs up to
/// the first `&` and is percent-decoded; malformed encodings yield `None`.
///
/// # Examples
///
/// ```
/// use gpt_saver::bookmark::deep_link_id;
///
/// assert_eq!(
///     deep_link_id("https://chatgpt.com/c/1#gpt-saver=bm-abc&x=1"),
///     Some("bm-abc".to_string())
/// );
/// assert_eq!(deep_link_id("https://chatgpt.com/c/1#other"), None);
/// ```
pub fn deep_link_id(url: &str) -> Option<String> {
    let fragment = &url[url.find('#')? + 1..];
    let value = fragment.strip_prefix(DEEP_LINK_KEY)?.strip_prefix('=')?;
    let raw = value.split('&').next().unwrap_or_default();
    if raw.is_empty() {
        return None;
    }
    decode_component(raw)
}

/// Percent-encode like `encodeURIComponent`.
pub fn encode_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Percent-decode like `decodeURIComponent`, rejecting malformed input.
pub fn decode_component(value: &str) -> Option<String> {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = value.get(i + 1..i + 3)?;
            if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return None;
            }
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}
