//! Control surface
//!
//! The list of saved bookmarks with their actions: open, copy link, delete,
//! and a theme toggle. [`ControlSurface`] holds the logic; drawing is left to
//! a [`SurfaceView`], and every host capability comes from the [`Platform`].

use std::sync::Arc;

use regex::Regex;

use crate::bookmark::{conversation_base, Bookmark};
use crate::config::{Config, ControlConfig};
use crate::error::Result;
use crate::platform::{JumpResponse, Platform, RuntimeMessage, Tab, TabQuery, TabUpdate};
use crate::storage::BookmarkStore;
use crate::timer::SupersedingTimer;

pub mod theme;
pub mod view;

pub use theme::{load_theme, save_theme, Theme, THEME_KEY};
pub use view::{
    AlwaysConfirm, BookmarkRow, Confirm, ListState, MemoryView, NeverConfirm, SurfaceView,
};

/// Placeholder shown when nothing is saved.
pub const EMPTY_PLACEHOLDER: &str = "No saved messages yet.";
/// Placeholder shown when the list cannot be read.
pub const LOAD_FAILED_PLACEHOLDER: &str = "Could not load saved messages.";
/// Toast after a successful copy.
pub const TOAST_COPIED: &str = "Link copied";
/// Toast after a failed copy.
pub const TOAST_COPY_FAILED: &str = "Copy failed";
/// Toast after a delete.
pub const TOAST_DELETED: &str = "Deleted";
/// Question asked before deleting.
pub const DELETE_PROMPT: &str = "Delete this bookmark?";

/// How a row was activated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowInput<'a> {
    /// Pointer click
    Click,
    /// Key press, by key name (`"Enter"`, `" "`, ...)
    Key(&'a str),
}

/// Whether `key` activates a focused row.
pub fn is_activation_key(key: &str) -> bool {
    matches!(key, "Enter" | " " | "Space" | "Spacebar")
}

/// Where opening a bookmark ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// The open conversation scrolled to the message in place
    Jumped,
    /// The active tab was navigated to the deep link
    NavigatedActive,
    /// Another chat tab in the window was navigated and focused
    NavigatedExisting,
    /// A new tab was opened at the deep link
    Created,
    /// Something failed and a new tab was opened as a last resort
    FallbackCreated,
    /// Even the last-resort tab could not be opened
    Failed,
}

/// Bookmark list logic shared by every control surface
#[derive(Debug)]
pub struct ControlSurface {
    platform: Platform,
    store: BookmarkStore,
    view: Arc<dyn SurfaceView>,
    host: Regex,
    config: ControlConfig,
    toast_timer: SupersedingTimer,
}

impl ControlSurface {
    /// Create a surface over `platform`, drawing on `view`.
    ///
    /// # Errors
    ///
    /// Returns `SaverError::Config` if the host URL pattern is invalid.
    pub fn new(platform: Platform, view: Arc<dyn SurfaceView>, config: &Config) -> Result<Self> {
        Ok(Self {
            store: platform.bookmarks(),
            platform,
            view,
            host: config.host.matcher()?,
            config: config.control.clone(),
            toast_timer: SupersedingTimer::new(),
        })
    }

    /// Bookmark store this surface reads and writes.
    pub fn store(&self) -> &BookmarkStore {
        &self.store
    }

    /// Apply the stored theme, then load the list.
    ///
    /// # Errors
    ///
    /// Returns the list load error; a theme read failure only degrades to
    /// the system preference.
    pub async fn start(&self) -> Result<Vec<Bookmark>> {
        self.apply_stored_theme().await;
        self.load_bookmarks().await
    }

    /// Apply the persisted theme, falling back to the system preference.
    pub async fn apply_stored_theme(&self) -> Theme {
        let stored = match load_theme(self.platform.storage.as_ref()).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!("Failed to read theme preference: {:#}", e);
                None
            }
        };
        let theme = stored.unwrap_or_else(|| Theme::from_system(self.view.prefers_dark()));
        self.view.apply_theme(theme);
        theme
    }

    /// Flip the applied theme (unset counts as dark) and persist it.
    ///
    /// The new theme is applied even if persisting fails.
    pub async fn toggle_theme(&self) -> Result<Theme> {
        let next = self.view.applied_theme().unwrap_or(Theme::Dark).toggled();
        self.view.apply_theme(next);
        save_theme(self.platform.storage.as_ref(), next).await?;
        tracing::info!(theme = %next, "Theme changed");
        Ok(next)
    }

    /// Load and render bookmarks, newest first.
    ///
    /// # Errors
    ///
    /// Returns the storage error after rendering the failure placeholder.
    pub async fn load_bookmarks(&self) -> Result<Vec<Bookmark>> {
        self.view.show_loading();
        let mut bookmarks = match self.store.list().await {
            Ok(bookmarks) => bookmarks,
            Err(e) => {
                self.view.render_placeholder(LOAD_FAILED_PLACEHOLDER);
                return Err(e);
            }
        };

        bookmarks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if bookmarks.is_empty() {
            self.view.render_placeholder(EMPTY_PLACEHOLDER);
        } else {
            let rows: Vec<BookmarkRow> = bookmarks.iter().map(BookmarkRow::from_bookmark).collect();
            self.view.render_rows(&rows);
        }
        tracing::debug!(count = bookmarks.len(), "Rendered bookmark list");
        Ok(bookmarks)
    }

    /// Copy the deep link of `bookmark` and report the outcome in a toast.
    pub async fn copy_link(&self, bookmark: &Bookmark) -> bool {
        let link = bookmark.deep_link();
        let copied = self.platform.clipboard.copy(&link).await;
        if copied {
            tracing::info!(id = %bookmark.id, "Copied link");
            self.show_toast(TOAST_COPIED);
        } else {
            self.show_toast(TOAST_COPY_FAILED);
        }
        copied
    }

    /// Copy the link when `input` activates the row.
    ///
    /// Returns `None` for input that is not an activation.
    pub async fn activate_row(&self, bookmark: &Bookmark, input: RowInput<'_>) -> Option<bool> {
        match input {
            RowInput::Click => Some(self.copy_link(bookmark).await),
            RowInput::Key(key) if is_activation_key(key) => Some(self.copy_link(bookmark).await),
            RowInput::Key(_) => None,
        }
    }

    /// Show `message` and hide it after the toast duration, superseding any
    /// pending hide.
    pub fn show_toast(&self, message: &str) {
        self.view.show_toast(message);
        let view = Arc::clone(&self.view);
        self.toast_timer.replace(self.config.toast(), move || view.hide_toast());
    }

    /// Bring the saved message into view, reusing an open tab when possible.
    ///
    /// Never fails: any unexpected error falls back to a new tab.
    pub async fn open_bookmark(&self, bookmark: &Bookmark) -> OpenOutcome {
        match self.try_open(bookmark).await {
            Ok(outcome) => {
                tracing::info!(id = %bookmark.id, outcome = ?outcome, "Opened bookmark");
                outcome
            }
            Err(e) => {
                tracing::warn!(id = %bookmark.id, "Open failed, creating a new tab: {:#}", e);
                match self.platform.tabs.create(&bookmark.deep_link()).await {
                    Ok(_) => OpenOutcome::FallbackCreated,
                    Err(e) => {
                        tracing::error!(id = %bookmark.id, "Could not open a tab: {:#}", e);
                        OpenOutcome::Failed
                    }
                }
            }
        }
    }

    fn is_host_tab(&self, tab: &Tab) -> bool {
        tab.url.as_deref().is_some_and(|url| self.host.is_match(url))
    }

    async fn try_open(&self, bookmark: &Bookmark) -> Result<OpenOutcome> {
        let tabs = &self.platform.tabs;
        let link = bookmark.deep_link();

        let active = tabs
            .query(TabQuery::ActiveInCurrentWindow)
            .await?
            .into_iter()
            .next();

        if let Some(tab) = active.filter(|t| self.is_host_tab(t)) {
            let tab_base = conversation_base(tab.url.as_deref().unwrap_or_default());
            if tab_base == conversation_base(&bookmark.conversation_url) {
                let jump = RuntimeMessage::Jump {
                    id: bookmark.id.clone(),
                };
                match tabs.send_message(tab.id, &jump).await {
                    Ok(JumpResponse { ok: true }) => {
                        tabs.update(tab.id, TabUpdate::focus()).await?;
                        return Ok(OpenOutcome::Jumped);
                    }
                    Ok(JumpResponse { ok: false }) => {
                        tracing::debug!(tab = %tab.id, "Page could not locate the message");
                    }
                    Err(e) => {
                        tracing::debug!(tab = %tab.id, "No answer from page: {:#}", e);
                    }
                }
            }
            tabs.update(tab.id, TabUpdate::navigate(link)).await?;
            return Ok(OpenOutcome::NavigatedActive);
        }

        let window = tabs.query(TabQuery::CurrentWindow).await?;
        if let Some(tab) = window.into_iter().find(|t| self.is_host_tab(t)) {
            let update = TabUpdate {
                url: Some(link),
                active: Some(true),
            };
            tabs.update(tab.id, update).await?;
            return Ok(OpenOutcome::NavigatedExisting);
        }

        tabs.create(&link).await?;
        Ok(OpenOutcome::Created)
    }

    /// Delete `id` after confirmation, then re-render.
    ///
    /// Returns `Ok(false)` when the user declined.
    pub async fn delete_bookmark(&self, id: &str, confirm: &dyn Confirm) -> Result<bool> {
        if !confirm.confirm(DELETE_PROMPT) {
            tracing::debug!(id, "Delete declined");
            return Ok(false);
        }
        self.store.remove(id).await?;
        tracing::info!(id, "Deleted bookmark");
        self.show_toast(TOAST_DELETED);
        self.load_bookmarks().await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::fake::{FakeTabs, RecordingClipboard, TabCall};
    use crate::platform::{Clipboard, ClipboardChain};
    use crate::storage::MemoryStore;
    use crate::test_utils::{bookmark_at, test_config};
    use std::time::Duration;

    struct Harness {
        surface: ControlSurface,
        tabs: Arc<FakeTabs>,
        view: Arc<MemoryView>,
        clipboard: Arc<RecordingClipboard>,
        kv: Arc<MemoryStore>,
    }

    fn harness_with(clipboard: RecordingClipboard, prefers_dark: bool) -> Harness {
        let tabs = Arc::new(FakeTabs::new());
        let view = Arc::new(MemoryView::new(prefers_dark));
        let clipboard = Arc::new(clipboard);
        let kv = Arc::new(MemoryStore::new());
        let platform = Platform::new(
            kv.clone(),
            tabs.clone(),
            ClipboardChain::new(Some(clipboard.clone() as Arc<dyn Clipboard>), None),
        );
        let surface = ControlSurface::new(platform, view.clone(), &test_config()).unwrap();
        Harness {
            surface,
            tabs,
            view,
            clipboard,
            kv,
        }
    }

    fn harness() -> Harness {
        harness_with(RecordingClipboard::new(), true)
    }

    #[tokio::test]
    async fn test_start_uses_system_preference_when_unset() {
        let h = harness_with(RecordingClipboard::new(), false);
        h.surface.start().await.unwrap();
        assert_eq!(h.view.applied_theme(), Some(Theme::Light));
    }

    #[tokio::test]
    async fn test_toggle_persists_and_wins_over_system() {
        let h = harness();
        h.surface.apply_stored_theme().await;
        assert_eq!(h.surface.toggle_theme().await.unwrap(), Theme::Light);
        assert_eq!(load_theme(h.kv.as_ref()).await.unwrap(), Some(Theme::Light));

        let reopened = MemoryView::new(true);
        let platform = Platform::new(
            h.kv.clone(),
            h.tabs.clone(),
            ClipboardChain::default(),
        );
        let fresh = ControlSurface::new(platform, Arc::new(reopened), &test_config()).unwrap();
        assert_eq!(fresh.apply_stored_theme().await, Theme::Light);
    }

    #[tokio::test]
    async fn test_toggle_from_unset_counts_as_dark() {
        let h = harness_with(RecordingClipboard::new(), false);
        assert_eq!(h.surface.toggle_theme().await.unwrap(), Theme::Light);
    }

    #[tokio::test]
    async fn test_theme_read_failure_falls_back_to_system() {
        let h = harness();
        h.kv.fail_reads(true);
        assert_eq!(h.surface.apply_stored_theme().await, Theme::Dark);
    }

    #[tokio::test]
    async fn test_list_sorted_newest_first() {
        let h = harness();
        for (id, t) in [("a", 1), ("c", 3), ("b", 2)] {
            h.surface.store().add(bookmark_at(id, t)).await.unwrap();
        }
        let listed = h.surface.load_bookmarks().await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);

        let history = h.view.list_history();
        assert_eq!(history[0], ListState::Loading);
        match h.view.list() {
            ListState::Rows(rows) => assert_eq!(rows.len(), 3),
            other => panic!("Expected rows, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_list_placeholder() {
        let h = harness();
        h.surface.load_bookmarks().await.unwrap();
        assert_eq!(
            h.view.list(),
            ListState::Placeholder(EMPTY_PLACEHOLDER.to_string())
        );
    }

    #[tokio::test]
    async fn test_failed_load_renders_failure_placeholder() {
        let h = harness();
        h.kv.fail_reads(true);
        assert!(h.surface.load_bookmarks().await.is_err());
        assert_eq!(
            h.view.list(),
            ListState::Placeholder(LOAD_FAILED_PLACEHOLDER.to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_copy_link_and_toast_hides() {
        let h = harness();
        let bm = bookmark_at("bm-1", 1);
        assert!(h.surface.copy_link(&bm).await);
        assert_eq!(h.clipboard.copied(), vec![bm.deep_link()]);
        assert_eq!(h.view.toast().as_deref(), Some(TOAST_COPIED));

        tokio::time::sleep(Duration::from_millis(1401)).await;
        assert_eq!(h.view.toast(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_copy_failure_toast() {
        let h = harness_with(RecordingClipboard::failing(), true);
        assert!(!h.surface.copy_link(&bookmark_at("bm-1", 1)).await);
        assert_eq!(h.view.toast().as_deref(), Some(TOAST_COPY_FAILED));
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_toast_supersedes_pending_hide() {
        let h = harness();
        h.surface.show_toast("first");
        tokio::time::sleep(Duration::from_millis(1000)).await;
        h.surface.show_toast("second");
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(h.view.toast().as_deref(), Some("second"));
        tokio::time::sleep(Duration::from_millis(401)).await;
        assert_eq!(h.view.toast(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_row_activation_keys() {
        let h = harness();
        let bm = bookmark_at("bm-1", 1);
        assert_eq!(h.surface.activate_row(&bm, RowInput::Click).await, Some(true));
        assert_eq!(h.surface.activate_row(&bm, RowInput::Key("Enter")).await, Some(true));
        assert_eq!(h.surface.activate_row(&bm, RowInput::Key(" ")).await, Some(true));
        assert_eq!(h.surface.activate_row(&bm, RowInput::Key("a")).await, None);
        assert_eq!(h.clipboard.copied().len(), 3);
    }

    #[tokio::test]
    async fn test_open_same_conversation_without_agent_navigates_active() {
        let h = harness();
        let bm = bookmark_at("bm-1", 1);
        let tab = h.tabs.add_tab("https://chatgpt.com/c/1?x=1", true);

        assert_eq!(h.surface.open_bookmark(&bm).await, OpenOutcome::NavigatedActive);
        let calls = h.tabs.calls();
        assert!(calls.contains(&TabCall::SendMessage(
            tab,
            RuntimeMessage::Jump {
                id: "bm-1".to_string()
            }
        )));
        assert!(calls.contains(&TabCall::Update(tab, TabUpdate::navigate(bm.deep_link()))));
    }

    #[tokio::test]
    async fn test_open_other_conversation_navigates_active() {
        let h = harness();
        let bm = bookmark_at("bm-1", 1);
        let tab = h.tabs.add_tab("https://chatgpt.com/c/other", true);

        assert_eq!(h.surface.open_bookmark(&bm).await, OpenOutcome::NavigatedActive);
        assert!(!h
            .tabs
            .calls()
            .iter()
            .any(|c| matches!(c, TabCall::SendMessage(..))));
        assert_eq!(h.tabs.tabs()[0].url, Some(bm.deep_link()));
        assert_eq!(h.tabs.tabs()[0].id, tab);
    }

    #[tokio::test]
    async fn test_open_focuses_host_tab_in_window() {
        let h = harness();
        let bm = bookmark_at("bm-1", 1);
        h.tabs.add_tab("https://docs.rs/", true);
        let chat = h.tabs.add_tab("https://chatgpt.com/c/9", false);
        h.tabs.add_tab("https://example.org/", false);

        assert_eq!(h.surface.open_bookmark(&bm).await, OpenOutcome::NavigatedExisting);
        let chat_tab = h.tabs.tabs().into_iter().find(|t| t.id == chat).unwrap();
        assert!(chat_tab.active);
        assert_eq!(chat_tab.url, Some(bm.deep_link()));
    }

    #[tokio::test]
    async fn test_open_without_host_tabs_creates() {
        let h = harness();
        let bm = bookmark_at("bm-1", 1);
        h.tabs.add_tab("https://docs.rs/", true);
        assert_eq!(h.surface.open_bookmark(&bm).await, OpenOutcome::Created);
        assert!(h.tabs.calls().contains(&TabCall::Create(bm.deep_link())));
    }

    #[tokio::test]
    async fn test_open_query_failure_falls_back_to_new_tab() {
        let h = harness();
        let bm = bookmark_at("bm-1", 1);
        h.tabs.fail_queries(true);
        assert_eq!(h.surface.open_bookmark(&bm).await, OpenOutcome::FallbackCreated);
        assert!(h.tabs.calls().contains(&TabCall::Create(bm.deep_link())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_confirmed_removes_only_target() {
        let h = harness();
        for (id, t) in [("a", 1), ("b", 2), ("c", 3)] {
            h.surface.store().add(bookmark_at(id, t)).await.unwrap();
        }
        assert!(h.surface.delete_bookmark("b", &AlwaysConfirm).await.unwrap());
        let ids: Vec<String> = h
            .surface
            .store()
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(h.view.toast().as_deref(), Some(TOAST_DELETED));
        match h.view.list() {
            ListState::Rows(rows) => assert_eq!(rows.len(), 2),
            other => panic!("Expected rows, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_declined_keeps_everything() {
        let h = harness();
        h.surface.store().add(bookmark_at("a", 1)).await.unwrap();
        assert!(!h.surface.delete_bookmark("a", &NeverConfirm).await.unwrap());
        assert_eq!(h.surface.store().list().await.unwrap().len(), 1);
        assert!(h.view.toasts().is_empty());
    }
}
