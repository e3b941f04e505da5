//! In-process fake host for tests and embedding
//!
//! [`FakeTabs`] keeps a window of tabs in memory and records every call made
//! against it. A tab can be connected to a [`PagePort`], in which case
//! [`Tabs::send_message`] is delivered to the page agent listening on the
//! other end of the channel; unconnected tabs behave like pages without an
//! agent and fail with `SaverError::Channel`.
//!
//! # Example
//!
//! ```
//! use gpt_saver::platform::fake::FakeTabs;
//! use gpt_saver::platform::{TabQuery, Tabs};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let tabs = FakeTabs::new();
//! let id = tabs.add_tab("https://chatgpt.com/c/1", true);
//! let active = tabs.query(TabQuery::ActiveInCurrentWindow).await.unwrap();
//! assert_eq!(active[0].id, id);
//! # }
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::error::{Result, SaverError};
use crate::platform::{
    Clipboard, JumpResponse, PagePort, RuntimeMessage, Tab, TabId, TabQuery, TabUpdate, Tabs,
};

/// A call made against [`FakeTabs`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabCall {
    /// [`Tabs::query`]
    Query(TabQuery),
    /// [`Tabs::update`]
    Update(TabId, TabUpdate),
    /// [`Tabs::create`]
    Create(String),
    /// [`Tabs::send_message`]
    SendMessage(TabId, RuntimeMessage),
}

#[derive(Debug, Default)]
struct FakeTabsState {
    tabs: Vec<Tab>,
    ports: HashMap<TabId, PagePort>,
    next_id: i64,
    calls: Vec<TabCall>,
    fail_queries: bool,
}

impl FakeTabsState {
    fn allocate(&mut self) -> TabId {
        self.next_id += 1;
        TabId(self.next_id)
    }

    fn activate(&mut self, id: TabId) {
        for tab in &mut self.tabs {
            tab.active = tab.id == id;
        }
    }
}

/// In-memory [`Tabs`] implementation
#[derive(Debug, Default)]
pub struct FakeTabs {
    state: Mutex<FakeTabsState>,
}

impl FakeTabs {
    /// Create an empty window.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeTabsState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a tab at `url`; an active tab takes focus from the others.
    pub fn add_tab(&self, url: &str, active: bool) -> TabId {
        let mut state = self.lock();
        let id = state.allocate();
        state.tabs.push(Tab {
            id,
            url: Some(url.to_string()),
            active: false,
        });
        if active {
            state.activate(id);
        }
        id
    }

    /// Route messages for `tab` to a page agent.
    pub fn connect(&self, tab: TabId, port: PagePort) {
        self.lock().ports.insert(tab, port);
    }

    /// Make every query fail with `SaverError::Tab`.
    pub fn fail_queries(&self, fail: bool) {
        self.lock().fail_queries = fail;
    }

    /// Calls made so far, oldest first.
    pub fn calls(&self) -> Vec<TabCall> {
        self.lock().calls.clone()
    }

    /// Snapshot of the window.
    pub fn tabs(&self) -> Vec<Tab> {
        self.lock().tabs.clone()
    }
}

#[async_trait::async_trait]
impl Tabs for FakeTabs {
    async fn query(&self, query: TabQuery) -> Result<Vec<Tab>> {
        let mut state = self.lock();
        state.calls.push(TabCall::Query(query));
        if state.fail_queries {
            return Err(SaverError::Tab("Tab query failed".to_string()).into());
        }
        let tabs = state
            .tabs
            .iter()
            .filter(|t| query == TabQuery::CurrentWindow || t.active)
            .cloned()
            .collect();
        Ok(tabs)
    }

    async fn update(&self, tab: TabId, update: TabUpdate) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(TabCall::Update(tab, update.clone()));
        let target = state
            .tabs
            .iter_mut()
            .find(|t| t.id == tab)
            .ok_or_else(|| SaverError::Tab(format!("No tab {}", tab)))?;
        if let Some(url) = update.url {
            target.url = Some(url);
        }
        if update.active == Some(true) {
            state.activate(tab);
        }
        Ok(())
    }

    async fn create(&self, url: &str) -> Result<Tab> {
        let mut state = self.lock();
        state.calls.push(TabCall::Create(url.to_string()));
        let id = state.allocate();
        state.tabs.push(Tab {
            id,
            url: Some(url.to_string()),
            active: false,
        });
        state.activate(id);
        Ok(Tab {
            id,
            url: Some(url.to_string()),
            active: true,
        })
    }

    async fn send_message(&self, tab: TabId, message: &RuntimeMessage) -> Result<JumpResponse> {
        let port = {
            let mut state = self.lock();
            state.calls.push(TabCall::SendMessage(tab, message.clone()));
            state.ports.get(&tab).cloned()
        };
        let port = port
            .ok_or_else(|| SaverError::Channel(format!("No page agent in tab {}", tab)))?;

        let reply = port
            .request(serde_json::to_value(message).map_err(SaverError::Serialization)?)
            .await?;
        serde_json::from_value(reply)
            .map_err(|e| SaverError::Channel(format!("Unexpected reply: {}", e)).into())
    }
}

/// [`Clipboard`] that remembers what it was given
#[derive(Debug, Default)]
pub struct RecordingClipboard {
    fail: AtomicBool,
    copied: Mutex<Vec<String>>,
}

impl RecordingClipboard {
    /// A working clipboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// A clipboard whose writes are refused.
    pub fn failing() -> Self {
        let clipboard = Self::default();
        clipboard.fail.store(true, Ordering::SeqCst);
        clipboard
    }

    /// Texts copied so far.
    pub fn copied(&self) -> Vec<String> {
        self.copied
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Clipboard for RecordingClipboard {
    async fn write_text(&self, text: &str) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SaverError::Clipboard("Clipboard access denied".to_string()).into());
        }
        self.copied
            .lock()
            .map_err(|_| SaverError::Clipboard("Clipboard lock poisoned".to_string()))?
            .push(text.to_string());
        Ok(())
    }
}
