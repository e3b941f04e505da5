//! Snippet extraction
//!
//! A snippet is the normalized, length-capped text fingerprint of a message.
//! The same function runs when a bookmark is saved and when the page is
//! searched for it later, so both sides always compare like with like.

/// Maximum snippet length in characters, including the ellipsis marker.
pub const MAX_SNIPPET_CHARS: usize = 120;

/// Marker appended to truncated snippets.
pub const ELLIPSIS: &str = "...";

const KEEP_CHARS: usize = MAX_SNIPPET_CHARS - ELLIPSIS.len();

/// Normalize message text into a snippet.
///
/// Whitespace runs collapse to a single space, the ends are trimmed, and text
/// longer than [`MAX_SNIPPET_CHARS`] keeps its first 117 characters followed by
/// [`ELLIPSIS`]. Lengths count characters, not bytes.
///
/// # Examples
///
/// ```
/// use gpt_saver::snippet::snippet;
///
/// assert_eq!(snippet("  How do\n\tI   reverse a list? "), "How do I reverse a list?");
/// assert_eq!(snippet(&"x".repeat(200)).chars().count(), 120);
/// ```
pub fn snippet(text: &str) -> String {
    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if cleaned.chars().count() > MAX_SNIPPET_CHARS {
        let mut truncated: String = cleaned.chars().take(KEEP_CHARS).collect();
        truncated.push_str(ELLIPSIS);
        truncated
    } else {
        cleaned
    }
}

/// First `n` characters of `text`.
pub(crate) fn char_prefix(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
