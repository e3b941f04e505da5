//! Host capabilities
//!
//! Everything the core needs from its host is behind a trait here: tabs, the
//! clipboard and (in [`crate::storage`]) key-value storage. A [`Platform`]
//! bundles one implementation of each and is resolved once at startup, so
//! the rest of the crate never asks which host it runs in.
//!
//! - [`channel`]: in-process request/reply channel between a control surface
//!   and a page agent.
//! - [`desktop`]: the terminal host used by the CLI.
//! - [`fake`]: an in-memory host for tests and embedding.

use std::fmt::Debug;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Result;
use crate::storage::{BookmarkStore, KeyValueStore, MemoryStore, SledStore};

pub mod channel;
pub mod desktop;
pub mod fake;

pub use channel::{page_channel, IncomingMessage, PagePort};

/// Message type tag of a jump request.
pub const JUMP_MESSAGE_TYPE: &str = "gpt-saver-jump";

/// Host-assigned tab identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TabId(pub i64);

impl std::fmt::Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A browser tab as reported by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    /// Tab identifier
    pub id: TabId,
    /// Current URL, when the host exposes it
    pub url: Option<String>,
    /// Whether the tab is the focused one in its window
    pub active: bool,
}

/// Which tabs to return from [`Tabs::query`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabQuery {
    /// The focused tab of the current window
    ActiveInCurrentWindow,
    /// Every tab of the current window
    CurrentWindow,
}

/// Changes to apply with [`Tabs::update`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabUpdate {
    /// Navigate to this URL
    pub url: Option<String>,
    /// Focus (or unfocus) the tab
    pub active: Option<bool>,
}

impl TabUpdate {
    /// Navigate to `url`.
    pub fn navigate(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            active: None,
        }
    }

    /// Focus the tab.
    pub fn focus() -> Self {
        Self {
            url: None,
            active: Some(true),
        }
    }
}

/// Typed messages exchanged between surfaces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RuntimeMessage {
    /// Ask a page to scroll to and highlight a saved message
    #[serde(rename = "gpt-saver-jump")]
    Jump {
        /// Bookmark id
        id: String,
    },
}

/// Reply to [`RuntimeMessage::Jump`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JumpResponse {
    /// Whether the message was located and highlighted
    pub ok: bool,
}

/// Tab management offered by the host
#[async_trait::async_trait]
pub trait Tabs: Send + Sync + Debug {
    /// List tabs matching `query`.
    async fn query(&self, query: TabQuery) -> Result<Vec<Tab>>;

    /// Navigate and/or focus a tab.
    async fn update(&self, tab: TabId, update: TabUpdate) -> Result<()>;

    /// Open a new tab at `url`.
    async fn create(&self, url: &str) -> Result<Tab>;

    /// Deliver a message to the page running in `tab` and wait for its reply.
    ///
    /// # Errors
    ///
    /// Returns `SaverError::Channel` when nothing in the tab answers.
    async fn send_message(&self, tab: TabId, message: &RuntimeMessage) -> Result<JumpResponse>;
}

/// One way of putting text on the clipboard
#[async_trait::async_trait]
pub trait Clipboard: Send + Sync + Debug {
    /// Copy `text`.
    async fn write_text(&self, text: &str) -> Result<()>;
}

/// Primary clipboard with a fallback path
#[derive(Debug, Clone, Default)]
pub struct ClipboardChain {
    /// Preferred clipboard, absent when the host has none
    pub primary: Option<Arc<dyn Clipboard>>,
    /// Used when the primary is absent or fails
    pub fallback: Option<Arc<dyn Clipboard>>,
}

impl ClipboardChain {
    /// Build a chain from its two halves.
    pub fn new(primary: Option<Arc<dyn Clipboard>>, fallback: Option<Arc<dyn Clipboard>>) -> Self {
        Self { primary, fallback }
    }

    /// Copy `text`, trying the primary first. Returns whether any path worked.
    pub async fn copy(&self, text: &str) -> bool {
        if let Some(primary) = &self.primary {
            match primary.write_text(text).await {
                Ok(()) => return true,
                Err(e) => tracing::debug!("Primary clipboard failed, trying fallback: {}", e),
            }
        }
        match &self.fallback {
            Some(fallback) => match fallback.write_text(text).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("Fallback clipboard failed: {}", e);
                    false
                }
            },
            None => false,
        }
    }
}

/// The capability bundle handed to the control surface
#[derive(Debug, Clone)]
pub struct Platform {
    /// Persistent key-value storage
    pub storage: Arc<dyn KeyValueStore>,
    /// Tab management
    pub tabs: Arc<dyn Tabs>,
    /// Clipboard access
    pub clipboard: ClipboardChain,
}

impl Platform {
    /// Bundle explicit implementations.
    pub fn new(
        storage: Arc<dyn KeyValueStore>,
        tabs: Arc<dyn Tabs>,
        clipboard: ClipboardChain,
    ) -> Self {
        Self {
            storage,
            tabs,
            clipboard,
        }
    }

    /// Resolve the desktop host: sled storage, the system URL handler and
    /// clipboard (or the configured commands), OSC 52 as the clipboard
    /// fallback.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured command cannot be parsed or the
    /// storage location cannot be determined or opened.
    pub fn desktop(config: &Config) -> Result<Self> {
        let path = match &config.storage.path {
            Some(path) => path.clone(),
            None => SledStore::default_path()?,
        };
        let storage = Arc::new(SledStore::open(path)?);
        let tabs = Arc::new(desktop::SystemTabs::new(config.desktop.opener_command()?));
        let primary: Arc<dyn Clipboard> = match config.desktop.clipboard_command()? {
            Some(cmd) => Arc::new(desktop::CommandClipboard::new(cmd)),
            None => Arc::new(desktop::SystemClipboard),
        };
        let fallback: Arc<dyn Clipboard> = Arc::new(desktop::Osc52Clipboard);

        Ok(Self::new(
            storage,
            tabs,
            ClipboardChain::new(Some(primary), Some(fallback)),
        ))
    }

    /// Resolve an in-process host with memory storage around the given tabs.
    pub fn in_memory(tabs: Arc<dyn Tabs>, clipboard: ClipboardChain) -> Self {
        Self::new(Arc::new(MemoryStore::new()), tabs, clipboard)
    }

    /// Bookmark CRUD over this platform's storage.
    pub fn bookmarks(&self) -> BookmarkStore {
        BookmarkStore::new(Arc::clone(&self.storage))
    }
}
