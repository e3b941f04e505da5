//! Page side of gpt-saver
//!
//! Runs inside a conversation page. It attaches a save control to every user
//! message, persists bookmarks when one is clicked, and scrolls to a saved
//! message when the page was opened through a deep link or when a control
//! surface asks it to jump.
//!
//! - [`dom`]: the [`PageDom`] contract the agent drives.
//! - [`memory_dom`]: a headless page for tests and embedding.
//! - [`agent`]: the [`PageAgent`] event loop.

pub mod agent;
pub mod dom;
pub mod memory_dom;

pub use agent::PageAgent;
pub use dom::{NodeId, PageDom, PageEvent, SaveControl, HIGHLIGHT_CLASS, SAVE_CONTROL, STYLE_ID};
pub use memory_dom::MemoryDom;
