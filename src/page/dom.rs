//! Host page contract
//!
//! The page agent never touches a concrete DOM. It sees the page through
//! [`PageDom`]: a list of user-message elements identified by [`NodeId`],
//! their text, a few style/class mutations, and an event subscription that
//! reports structural changes and save-control clicks.

use std::fmt::Debug;

use tokio::sync::mpsc;

/// Attribute (and value) that marks a user message in the host page.
pub const USER_ROLE_ATTRIBUTE: (&str, &str) = ("data-message-author-role", "user");

/// Id of the injected stylesheet.
pub const STYLE_ID: &str = "gpt-saver-style";

/// Class added to a message while it is highlighted.
pub const HIGHLIGHT_CLASS: &str = "gpt-saver-highlight";

/// Rules for the save control and the highlight.
pub const STYLESHEET: &str = r#"
.gpt-saver-btn {
  position: absolute;
  top: 6px;
  left: 100%;
  transform: translateX(8px);
  font-size: 12px;
  cursor: pointer;
  opacity: 0.6;
  border: none;
  background: transparent;
  padding: 0;
  z-index: 2;
}
.gpt-saver-btn:hover {
  opacity: 1;
}
.gpt-saver-highlight {
  outline: 2px solid orange;
  outline-offset: 3px;
  border-radius: 6px;
}
"#;

/// Stable identity of an element for as long as it stays in the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// The small button injected next to each user message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveControl {
    /// CSS class of the button
    pub class_name: &'static str,
    /// Visible label
    pub label: &'static str,
    /// Tooltip
    pub title: &'static str,
}

/// The save control every message receives.
pub const SAVE_CONTROL: SaveControl = SaveControl {
    class_name: "gpt-saver-btn",
    label: "💾",
    title: "Save this message",
};

/// Something that happened in the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    /// Children were inserted or removed somewhere in the content subtree
    Mutation,
    /// The save control of a message was clicked; the click does not
    /// propagate to the message itself
    SaveClicked(NodeId),
}

/// Operations the page agent needs from the host page
///
/// Operations on nodes that have left the page are silently ignored.
pub trait PageDom: Send + Sync + Debug {
    /// Current page URL, including query and fragment.
    fn href(&self) -> String;

    /// User-message elements in document order.
    fn user_messages(&self) -> Vec<NodeId>;

    /// Visible text of an element.
    fn text_content(&self, node: NodeId) -> String;

    /// Whether the element's computed position is `static` (or unset).
    fn is_statically_positioned(&self, node: NodeId) -> bool;

    /// Give the element `position: relative`.
    fn set_position_relative(&self, node: NodeId);

    /// Append a save control as the element's last child.
    fn append_control(&self, node: NodeId, control: &SaveControl);

    /// Add a CSS class to the element.
    fn add_class(&self, node: NodeId, class: &str);

    /// Remove a CSS class from the element.
    fn remove_class(&self, node: NodeId, class: &str);

    /// Smooth-scroll the element to the vertical center of the viewport.
    fn scroll_into_view(&self, node: NodeId);

    /// Insert a stylesheet under `id` unless one with that id exists.
    fn ensure_stylesheet(&self, id: &str, css: &str);

    /// Subscribe to page events for as long as the receiver lives.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<PageEvent>;
}
