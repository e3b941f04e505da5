//! gpt-saver - bookmarks for individual chat messages
//!
//! A page agent attaches a save control to every user message of a chat
//! conversation and persists a small bookmark record when one is clicked. A
//! control surface lists the bookmarks and brings a saved message back into
//! view, either by asking an open page to jump to it or by opening a deep
//! link that the page agent resolves on load.
//!
//! # Architecture
//!
//! - `bookmark`: the persisted record, ids and deep links
//! - `snippet`: text normalization used both at save and locate time
//! - `locator`: re-identification of a saved message on a live page
//! - `storage`: key-value storage trait, backends and bookmark CRUD
//! - `platform`: host capabilities (tabs, clipboard, page channel)
//! - `page`: page DOM contract and the page agent
//! - `control`: the control surface (list, open, copy, delete, theme)
//! - `timer`: delayed one-shot tasks
//! - `config`, `cli`, `commands`, `error`: the terminal front end
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use gpt_saver::page::{MemoryDom, PageAgent};
//! use gpt_saver::storage::{BookmarkStore, MemoryStore};
//! use gpt_saver::Config;
//!
//! # #[tokio::main]
//! # async fn main() -> gpt_saver::Result<()> {
//! let dom = Arc::new(MemoryDom::new("https://chatgpt.com/c/123"));
//! let node = dom.push_message("user", "How do I reverse a list?");
//! let store = BookmarkStore::new(Arc::new(MemoryStore::new()));
//! let agent = PageAgent::new(dom, store.clone(), Config::default().page);
//!
//! agent.attach_controls();
//! let saved = agent.save_message(node).await?;
//! assert_eq!(store.list().await?, vec![saved]);
//! # Ok(())
//! # }
//! ```

pub mod bookmark;
pub mod cli;
pub mod commands;
pub mod config;
pub mod control;
pub mod error;
pub mod locator;
pub mod page;
pub mod platform;
pub mod snippet;
pub mod storage;
pub mod timer;

// Re-export commonly used types
pub use bookmark::Bookmark;
pub use config::Config;
pub use control::{ControlSurface, OpenOutcome, Theme};
pub use error::{Result, SaverError};
pub use page::PageAgent;
pub use platform::Platform;

#[cfg(test)]
pub mod test_utils;
