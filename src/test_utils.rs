//! Test utilities for gpt-saver
//!
//! Shared fixtures for unit tests: bookmark records and a configuration
//! whose host pattern also accepts the `chat.example.com` test host.

use crate::bookmark::Bookmark;
use crate::config::Config;

/// Host pattern used by tests.
pub const TEST_HOST_PATTERN: &str = r"https?://(chat\.openai|chatgpt|chat\.example)\.com/";

/// A bookmark in `https://chatgpt.com/c/1` with a fixed id and timestamp
///
/// # Examples
///
/// ```ignore
/// let bm = bookmark_at("bm-1", 42);
/// assert_eq!(bm.created_at, 42);
/// ```
pub fn bookmark_at(id: &str, created_at: i64) -> Bookmark {
    Bookmark {
        id: id.to_string(),
        conversation_url: "https://chatgpt.com/c/1".to_string(),
        index: 0,
        text_snippet: format!("message {}", id),
        created_at,
    }
}

/// Default configuration with [`TEST_HOST_PATTERN`].
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.host.url_pattern = TEST_HOST_PATTERN.to_string();
    config
}
