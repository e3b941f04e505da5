//! Error types for gpt-saver
//!
//! This module defines the error taxonomy shared by the page agent, the
//! control surface and the CLI, using `thiserror` for the variants and
//! `anyhow` for propagation.

use thiserror::Error;

/// Main error type for gpt-saver operations
///
/// Host capabilities (storage, tabs, clipboard, message channel) fail with
/// their own variant so top-level handlers can decide how to degrade.
#[derive(Error, Debug)]
pub enum SaverError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Key-value store read/write failures
    #[error("Storage error: {0}")]
    Storage(String),

    /// Tab query/update/create failures
    #[error("Tab error: {0}")]
    Tab(String),

    /// Cross-surface message channel failures (no listener, dropped reply)
    #[error("Channel error: {0}")]
    Channel(String),

    /// Clipboard write failures
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    /// A bookmark record that cannot be used as given
    #[error("Invalid bookmark: {0}")]
    InvalidBookmark(String),

    /// Requested bookmark id is not in the store
    #[error("Bookmark not found: {0}")]
    BookmarkNotFound(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for gpt-saver operations
///
/// Uses `anyhow::Error` so callers can attach context while still being able
/// to downcast to [`SaverError`].
pub type Result<T> = anyhow::Result<T>;
