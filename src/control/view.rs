//! What a control surface draws on
//!
//! [`SurfaceView`] is the rendering side of a control surface: theme,
//! list rows, placeholders and the toast. [`MemoryView`] records every call
//! so the surface logic can be checked without a UI.

use std::fmt::Debug;
use std::sync::{Mutex, MutexGuard};

use chrono::{Local, TimeZone};

use crate::bookmark::Bookmark;
use crate::control::theme::Theme;

/// One rendered bookmark
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkRow {
    /// Bookmark id, used by the row actions
    pub id: String,
    /// Saved text snippet
    pub snippet: String,
    /// Local date and time of creation
    pub created: String,
    /// Deep link to the message
    pub link: String,
}

impl BookmarkRow {
    /// Render `bookmark` for display in the local time zone.
    pub fn from_bookmark(bookmark: &Bookmark) -> Self {
        Self {
            id: bookmark.id.clone(),
            snippet: bookmark.text_snippet.clone(),
            created: format_local(bookmark.created_at),
            link: bookmark.deep_link(),
        }
    }
}

/// Format epoch milliseconds as a local date-time string.
pub fn format_local(millis: i64) -> String {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

/// Rendering operations of a control surface
pub trait SurfaceView: Send + Sync + Debug {
    /// Whether the system asks for a dark colour scheme.
    fn prefers_dark(&self) -> bool;

    /// Apply `theme`.
    fn apply_theme(&self, theme: Theme);

    /// Currently applied theme, `None` before the first apply.
    fn applied_theme(&self) -> Option<Theme>;

    /// Replace the list with a loading indicator.
    fn show_loading(&self);

    /// Replace the list with `rows`.
    fn render_rows(&self, rows: &[BookmarkRow]);

    /// Replace the list with a single placeholder line.
    fn render_placeholder(&self, message: &str);

    /// Show a transient message.
    fn show_toast(&self, message: &str);

    /// Hide the toast.
    fn hide_toast(&self);
}

/// Asks the user a yes/no question
pub trait Confirm: Send + Sync {
    /// `true` if the user agreed.
    fn confirm(&self, prompt: &str) -> bool;
}

/// [`Confirm`] that always agrees
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// [`Confirm`] that always declines
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverConfirm;

impl Confirm for NeverConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}

/// State of the list area of a [`MemoryView`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ListState {
    /// Nothing rendered yet
    #[default]
    Blank,
    /// Loading indicator
    Loading,
    /// Rendered rows
    Rows(Vec<BookmarkRow>),
    /// A placeholder line
    Placeholder(String),
}

#[derive(Debug, Default)]
struct MemoryViewState {
    prefers_dark: bool,
    theme: Option<Theme>,
    list: ListState,
    list_history: Vec<ListState>,
    toast: Option<String>,
    toasts: Vec<String>,
}

/// Recording [`SurfaceView`]
#[derive(Debug, Default)]
pub struct MemoryView {
    state: Mutex<MemoryViewState>,
}

impl MemoryView {
    /// A view whose system preference is `prefers_dark`.
    pub fn new(prefers_dark: bool) -> Self {
        Self {
            state: Mutex::new(MemoryViewState {
                prefers_dark,
                ..MemoryViewState::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryViewState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_list(&self, list: ListState) {
        let mut state = self.lock();
        state.list_history.push(list.clone());
        state.list = list;
    }

    /// Current list area.
    pub fn list(&self) -> ListState {
        self.lock().list.clone()
    }

    /// Every list state rendered, oldest first.
    pub fn list_history(&self) -> Vec<ListState> {
        self.lock().list_history.clone()
    }

    /// Toast currently visible.
    pub fn toast(&self) -> Option<String> {
        self.lock().toast.clone()
    }

    /// Every toast shown, oldest first.
    pub fn toasts(&self) -> Vec<String> {
        self.lock().toasts.clone()
    }
}

impl SurfaceView for MemoryView {
    fn prefers_dark(&self) -> bool {
        self.lock().prefers_dark
    }

    fn apply_theme(&self, theme: Theme) {
        self.lock().theme = Some(theme);
    }

    fn applied_theme(&self) -> Option<Theme> {
        self.lock().theme
    }

    fn show_loading(&self) {
        self.set_list(ListState::Loading);
    }

    fn render_rows(&self, rows: &[BookmarkRow]) {
        self.set_list(ListState::Rows(rows.to_vec()));
    }

    fn render_placeholder(&self, message: &str) {
        self.set_list(ListState::Placeholder(message.to_string()));
    }

    fn show_toast(&self, message: &str) {
        let mut state = self.lock();
        state.toast = Some(message.to_string());
        state.toasts.push(message.to_string());
    }

    fn hide_toast(&self) {
        self.lock().toast = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_from_bookmark() {
        let bm = Bookmark {
            id: "bm-1 x".to_string(),
            conversation_url: "https://chatgpt.com/c/1".to_string(),
            index: 0,
            text_snippet: "hello".to_string(),
            created_at: 0,
        };
        let row = BookmarkRow::from_bookmark(&bm);
        assert_eq!(row.snippet, "hello");
        assert_eq!(row.link, "https://chatgpt.com/c/1#gpt-saver=bm-1%20x");
        assert!(!row.created.is_empty());
    }

    #[test]
    fn test_memory_view_records() {
        let view = MemoryView::new(true);
        assert!(view.prefers_dark());
        assert_eq!(view.applied_theme(), None);
        view.show_loading();
        view.render_placeholder("none");
        view.show_toast("hi");
        view.hide_toast();
        assert_eq!(
            view.list_history(),
            vec![ListState::Loading, ListState::Placeholder("none".to_string())]
        );
        assert_eq!(view.toast(), None);
        assert_eq!(view.toasts(), vec!["hi"]);
    }
}
