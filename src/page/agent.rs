//! Page agent event loop
//!
//! One [`PageAgent`] per page. It owns the messages that already carry a save
//! control, each with its position at attach time, and reacts to three sources: page events (mutations and
//! save clicks), jump requests from a control surface, and shutdown.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::bookmark::{deep_link_id, Bookmark};
use crate::config::PageConfig;
use crate::error::{Result, SaverError};
use crate::locator::{locate, Located};
use crate::page::dom::{NodeId, PageDom, PageEvent, HIGHLIGHT_CLASS, SAVE_CONTROL, STYLESHEET, STYLE_ID};
use crate::platform::{IncomingMessage, JumpResponse, RuntimeMessage};
use crate::storage::BookmarkStore;
use crate::timer::schedule;

/// Attaches save controls, saves bookmarks and reveals saved messages
#[derive(Debug)]
pub struct PageAgent {
    dom: Arc<dyn PageDom>,
    store: BookmarkStore,
    config: PageConfig,
    processed: Mutex<HashMap<NodeId, usize>>,
}

impl PageAgent {
    /// Create an agent for `dom`, persisting into `store`.
    pub fn new(dom: Arc<dyn PageDom>, store: BookmarkStore, config: PageConfig) -> Self {
        Self {
            dom,
            store,
            config,
            processed: Mutex::new(HashMap::new()),
        }
    }

    fn processed(&self) -> MutexGuard<'_, HashMap<NodeId, usize>> {
        self.processed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Give every unprocessed user message a save control.
    ///
    /// Returns how many controls were attached. Running it again without new
    /// messages attaches nothing.
    pub fn attach_controls(&self) -> usize {
        self.dom.ensure_stylesheet(STYLE_ID, STYLESHEET);

        let messages = self.dom.user_messages();
        let mut processed = self.processed();
        let mut attached = 0;
        for (index, node) in messages.into_iter().enumerate() {
            if processed.contains_key(&node) {
                continue;
            }
            processed.insert(node, index);
            if self.dom.is_statically_positioned(node) {
                self.dom.set_position_relative(node);
            }
            self.dom.append_control(node, &SAVE_CONTROL);
            attached += 1;
        }

        if attached > 0 {
            tracing::debug!(attached, total = processed.len(), "Attached save controls");
        }
        attached
    }

    /// Save `node` as a bookmark and flash it.
    ///
    /// The index is the node's position among the user messages when its
    /// save control was attached. A node without a control uses its current
    /// position.
    ///
    /// # Errors
    ///
    /// Returns `SaverError::InvalidBookmark` if the node has no control and
    /// is not a user message, or the store error if persisting fails.
    pub async fn save_message(&self, node: NodeId) -> Result<Bookmark> {
        let attached = self.processed().get(&node).copied();
        let index = match attached {
            Some(index) => index,
            None => self
                .dom
                .user_messages()
                .iter()
                .position(|n| *n == node)
                .ok_or_else(|| {
                    SaverError::InvalidBookmark(format!("Message {:?} is not on the page", node))
                })?,
        };

        let bookmark = Bookmark::capture(&self.dom.href(), index, &self.dom.text_content(node));
        self.store.add(bookmark.clone()).await?;
        tracing::info!(id = %bookmark.id, index, "Saved message");

        self.flash(node, self.config.save_feedback());
        Ok(bookmark)
    }

    fn flash(&self, node: NodeId, duration: std::time::Duration) {
        self.dom.add_class(node, HIGHLIGHT_CLASS);
        let dom = Arc::clone(&self.dom);
        schedule(duration, move || dom.remove_class(node, HIGHLIGHT_CLASS));
    }

    /// Highlight `node`, scroll it to the center, and clear the highlight
    /// later.
    pub fn highlight_and_scroll(&self, node: NodeId) {
        self.flash(node, self.config.highlight());
        self.dom.scroll_into_view(node);
    }

    /// Find the live message a bookmark refers to.
    pub fn locate_bookmark(&self, bookmark: &Bookmark) -> Option<Located<NodeId>> {
        let nodes = self.dom.user_messages();
        locate(bookmark, &nodes, |node| self.dom.text_content(*node))
    }

    /// Look up `id`, locate its message and reveal it.
    ///
    /// `Ok(false)` when the bookmark is unknown or nothing matches.
    pub async fn reveal(&self, id: &str) -> Result<bool> {
        let Some(bookmark) = self.store.find(id).await? else {
            tracing::debug!(id, "No bookmark with this id");
            return Ok(false);
        };
        match self.locate_bookmark(&bookmark) {
            Some(found) => {
                tracing::debug!(id, position = found.position, kind = ?found.kind, "Located message");
                self.highlight_and_scroll(found.item);
                Ok(true)
            }
            None => {
                tracing::debug!(id, "Bookmarked message not found on page");
                Ok(false)
            }
        }
    }

    /// Reveal the bookmark named in the page URL fragment, if any.
    ///
    /// Waits for the configured delay first so the page can render.
    pub async fn handle_deep_link(&self) -> Result<bool> {
        let Some(id) = deep_link_id(&self.dom.href()) else {
            return Ok(false);
        };
        tracing::debug!(id = %id, "Deep link present, waiting for page to render");
        tokio::time::sleep(self.config.deep_link_delay()).await;
        self.reveal(&id).await
    }

    /// Poll until at least one user message exists or attempts run out.
    pub async fn wait_for_messages(&self) -> bool {
        for attempt in 1..=self.config.jump_max_attempts {
            if !self.dom.user_messages().is_empty() {
                return true;
            }
            tracing::trace!(attempt, "No messages yet");
            tokio::time::sleep(self.config.jump_retry_delay()).await;
        }
        !self.dom.user_messages().is_empty()
    }

    /// Answer a jump request for `id`.
    pub async fn jump_to(&self, id: &str) -> Result<bool> {
        if !self.wait_for_messages().await {
            tracing::debug!(id, "Gave up waiting for messages");
            return Ok(false);
        }
        self.reveal(id).await
    }

    /// Handle one message from the page channel.
    ///
    /// Only jump requests with a non-empty id are answered; anything else is
    /// dropped without a reply.
    pub async fn handle_message(&self, message: IncomingMessage) {
        let IncomingMessage { payload, reply } = message;
        let id = match serde_json::from_value::<RuntimeMessage>(payload) {
            Ok(RuntimeMessage::Jump { id }) if !id.is_empty() => id,
            Ok(_) => {
                tracing::debug!("Ignoring jump request without id");
                return;
            }
            Err(e) => {
                tracing::debug!("Ignoring unrecognized message: {}", e);
                return;
            }
        };

        let ok = match self.jump_to(&id).await {
            Ok(ok) => ok,
            Err(e) => {
                tracing::warn!(id = %id, "Jump failed: {:#}", e);
                false
            }
        };

        match serde_json::to_value(JumpResponse { ok }) {
            Ok(value) => {
                if reply.send(value).is_err() {
                    tracing::debug!(id = %id, "Requester went away before the reply");
                }
            }
            Err(e) => tracing::error!("Failed to encode jump response: {}", e),
        }
    }

    /// Run until `shutdown` fires or the page stops producing events.
    ///
    /// Attaches controls immediately, starts deep-link activation in the
    /// background, then serves page events and jump requests.
    pub async fn run(
        self: Arc<Self>,
        mut requests: mpsc::Receiver<IncomingMessage>,
        shutdown: CancellationToken,
    ) {
        let mut events = self.dom.subscribe();
        self.attach_controls();

        let deep_link_agent = Arc::clone(&self);
        let deep_link = tokio::spawn(async move {
            if let Err(e) = deep_link_agent.handle_deep_link().await {
                tracing::error!("Deep link activation failed: {:#}", e);
            }
        });

        let mut requests_open = true;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::debug!("Page agent shutting down");
                    break;
                }
                event = events.recv() => match event {
                    Some(PageEvent::Mutation) => {
                        self.attach_controls();
                    }
                    Some(PageEvent::SaveClicked(node)) => {
                        if let Err(e) = self.save_message(node).await {
                            tracing::error!("Failed to save message: {:#}", e);
                        }
                    }
                    None => {
                        tracing::debug!("Page event stream closed");
                        break;
                    }
                },
                message = requests.recv(), if requests_open => match message {
                    Some(message) => {
                        let agent = Arc::clone(&self);
                        tokio::spawn(async move { agent.handle_message(message).await });
                    }
                    None => requests_open = false,
                },
            }
        }

        deep_link.abort();
    }
}
