//! In-process request/reply channel to a page
//!
//! The control surface talks to a page agent through a [`PagePort`]; the
//! agent receives [`IncomingMessage`]s, each carrying its own reply slot.
//! Dropping the reply slot without answering is how a page says "not for
//! me", and the sender sees it as a channel error.
//!
//! ```text
//! PagePort::request() --> mpsc --> IncomingMessage (agent)
//!        ^                                 |
//!        +----------- oneshot reply -------+
//! ```

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::error::{Result, SaverError};

/// A message delivered to a page, with the slot for its reply
#[derive(Debug)]
pub struct IncomingMessage {
    /// Raw JSON payload as sent
    pub payload: Value,
    /// Reply slot; drop it to leave the request unanswered
    pub reply: oneshot::Sender<Value>,
}

/// Sending half of a page channel
#[derive(Debug, Clone)]
pub struct PagePort {
    tx: mpsc::Sender<IncomingMessage>,
}

impl PagePort {
    /// Send `payload` and wait for the page's reply.
    ///
    /// # Errors
    ///
    /// Returns `SaverError::Channel` when the page is gone or drops the
    /// request without answering.
    pub async fn request(&self, payload: Value) -> Result<Value> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(IncomingMessage {
                payload,
                reply: reply_tx,
            })
            .await
            .map_err(|_| SaverError::Channel("No listener in target page".to_string()))?;

        reply_rx
            .await
            .map_err(|_| SaverError::Channel("Page did not answer the request".to_string()).into())
    }

    /// Whether the receiving page is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Create a connected `(PagePort, receiver)` pair.
///
/// # Examples
///
/// ```
/// use gpt_saver::platform::page_channel;
/// use serde_json::json;
///
/// # #[tokio::main]
/// # async fn main() {
/// let (port, mut inbox) = page_channel(4);
/// tokio::spawn(async move {
///     while let Some(msg) = inbox.recv().await {
///         let _ = msg.reply.send(json!({"ok": true}));
///     }
/// });
/// let reply = port.request(json!({"type": "ping"})).await.unwrap();
/// assert_eq!(reply, json!({"ok": true}));
/// # }
/// ```
pub fn page_channel(capacity: usize) -> (PagePort, mpsc::Receiver<IncomingMessage>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (PagePort { tx }, rx)
}
