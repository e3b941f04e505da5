//! In-memory page
//!
//! A headless [`PageDom`] holding a flat list of message elements. It emits
//! the same events a browser observer would (structural mutations and save
//! clicks) and records scrolls, so page agent behaviour can be driven and
//! observed without a browser.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use tokio::sync::mpsc;

use crate::page::dom::{NodeId, PageDom, PageEvent, SaveControl, USER_ROLE_ATTRIBUTE};

#[derive(Debug)]
struct MemNode {
    id: NodeId,
    role: String,
    text: String,
    position_static: bool,
    classes: BTreeSet<String>,
    controls: Vec<SaveControl>,
}

#[derive(Debug, Default)]
struct Inner {
    href: String,
    next_id: u64,
    nodes: Vec<MemNode>,
    stylesheets: BTreeMap<String, String>,
    scrolls: Vec<NodeId>,
    subscribers: Vec<mpsc::UnboundedSender<PageEvent>>,
}

impl Inner {
    fn node(&self, id: NodeId) -> Option<&MemNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut MemNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    fn emit(&mut self, event: PageEvent) {
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }
}

/// Headless [`PageDom`] for tests and embedding
#[derive(Debug)]
pub struct MemoryDom {
    inner: Mutex<Inner>,
}

impl MemoryDom {
    /// Create an empty page at `href`.
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                href: href.into(),
                ..Inner::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Change the page URL.
    pub fn set_href(&self, href: impl Into<String>) {
        self.lock().href = href.into();
    }

    /// Append a message with `role` (`"user"`, `"assistant"`, ...).
    pub fn push_message(&self, role: &str, text: &str) -> NodeId {
        let len = self.lock().nodes.len();
        self.insert_message(len, role, text)
    }

    /// Insert a message at `position` in document order.
    pub fn insert_message(&self, position: usize, role: &str, text: &str) -> NodeId {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = NodeId(inner.next_id);
        let at = position.min(inner.nodes.len());
        inner.nodes.insert(
            at,
            MemNode {
                id,
                role: role.to_string(),
                text: text.to_string(),
                position_static: true,
                classes: BTreeSet::new(),
                controls: Vec::new(),
            },
        );
        inner.emit(PageEvent::Mutation);
        id
    }

    /// Remove an element from the page.
    pub fn remove(&self, node: NodeId) {
        let mut inner = self.lock();
        let before = inner.nodes.len();
        inner.nodes.retain(|n| n.id != node);
        if inner.nodes.len() != before {
            inner.emit(PageEvent::Mutation);
        }
    }

    /// Replace an element's text (a character-data change, not structural).
    pub fn set_text(&self, node: NodeId, text: &str) {
        if let Some(n) = self.lock().node_mut(node) {
            n.text = text.to_string();
        }
    }

    /// Mark an element as already positioned (or not).
    pub fn set_positioned(&self, node: NodeId, positioned: bool) {
        if let Some(n) = self.lock().node_mut(node) {
            n.position_static = !positioned;
        }
    }

    /// Click the save control of `node`. Returns `false` if it has none.
    pub fn click_save(&self, node: NodeId) -> bool {
        let mut inner = self.lock();
        let has_control = inner.node(node).is_some_and(|n| !n.controls.is_empty());
        if has_control {
            inner.emit(PageEvent::SaveClicked(node));
        }
        has_control
    }

    /// Number of save controls attached to `node`.
    pub fn control_count(&self, node: NodeId) -> usize {
        self.lock().node(node).map_or(0, |n| n.controls.len())
    }

    /// Whether `node` currently has `class`.
    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.lock()
            .node(node)
            .is_some_and(|n| n.classes.contains(class))
    }

    /// Elements scrolled into view, oldest first.
    pub fn scrolls(&self) -> Vec<NodeId> {
        self.lock().scrolls.clone()
    }

    /// Number of injected stylesheets.
    pub fn stylesheet_count(&self) -> usize {
        self.lock().stylesheets.len()
    }
}

impl PageDom for MemoryDom {
    fn href(&self) -> String {
        self.lock().href.clone()
    }

    fn user_messages(&self) -> Vec<NodeId> {
        let (_, user_role) = USER_ROLE_ATTRIBUTE;
        self.lock()
            .nodes
            .iter()
            .filter(|n| n.role == user_role)
            .map(|n| n.id)
            .collect()
    }

    fn text_content(&self, node: NodeId) -> String {
        self.lock()
            .node(node)
            .map(|n| n.text.clone())
            .unwrap_or_default()
    }

    fn is_statically_positioned(&self, node: NodeId) -> bool {
        self.lock().node(node).is_some_and(|n| n.position_static)
    }

    fn set_position_relative(&self, node: NodeId) {
        self.set_positioned(node, true);
    }

    fn append_control(&self, node: NodeId, control: &SaveControl) {
        let mut inner = self.lock();
        if let Some(n) = inner.node_mut(node) {
            n.controls.push(*control);
            inner.emit(PageEvent::Mutation);
        }
    }

    fn add_class(&self, node: NodeId, class: &str) {
        if let Some(n) = self.lock().node_mut(node) {
            n.classes.insert(class.to_string());
        }
    }

    fn remove_class(&self, node: NodeId, class: &str) {
        if let Some(n) = self.lock().node_mut(node) {
            n.classes.remove(class);
        }
    }

    fn scroll_into_view(&self, node: NodeId) {
        let mut inner = self.lock();
        if inner.node(node).is_some() {
            inner.scrolls.push(node);
        }
    }

    fn ensure_stylesheet(&self, id: &str, css: &str) {
        self.lock()
            .stylesheets
            .entry(id.to_string())
            .or_insert_with(|| css.to_string());
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<PageEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().subscribers.push(tx);
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::dom::SAVE_CONTROL;

    #[test]
    fn test_user_messages_filters_by_role_in_document_order() {
        let dom = MemoryDom::new("https://chatgpt.com/c/1");
        let a = dom.push_message("user", "a");
        dom.push_message("assistant", "reply");
        let b = dom.push_message("user", "b");
        let c = dom.insert_message(0, "user", "c");
        assert_eq!(dom.user_messages(), vec![c, a, b]);
    }

    #[test]
    fn test_structural_changes_emit_mutations() {
        let dom = MemoryDom::new("https://chatgpt.com/c/1");
        let mut events = dom.subscribe();
        let node = dom.push_message("user", "a");
        dom.set_text(node, "edited");
        dom.remove(node);
        assert_eq!(events.try_recv().unwrap(), PageEvent::Mutation);
        assert_eq!(events.try_recv().unwrap(), PageEvent::Mutation);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_click_requires_control() {
        let dom = MemoryDom::new("https://chatgpt.com/c/1");
        let node = dom.push_message("user", "a");
        let mut events = dom.subscribe();
        assert!(!dom.click_save(node));
        dom.append_control(node, &SAVE_CONTROL);
        assert!(dom.click_save(node));
        assert_eq!(events.try_recv().unwrap(), PageEvent::Mutation);
        assert_eq!(events.try_recv().unwrap(), PageEvent::SaveClicked(node));
    }

    #[test]
    fn test_operations_on_removed_node_are_ignored() {
        let dom = MemoryDom::new("https://chatgpt.com/c/1");
        let node = dom.push_message("user", "a");
        dom.remove(node);
        dom.add_class(node, "x");
        dom.scroll_into_view(node);
        assert!(!dom.has_class(node, "x"));
        assert!(dom.scrolls().is_empty());
        assert_eq!(dom.text_content(node), "");
    }

    #[test]
    fn test_stylesheet_inserted_once() {
        let dom = MemoryDom::new("https://chatgpt.com/c/1");
        dom.ensure_stylesheet("s", "a{}");
        dom.ensure_stylesheet("s", "b{}");
        assert_eq!(dom.stylesheet_count(), 1);
    }
}
