//! Bookmark persistence
//!
//! The host provides a plain async key-value store ([`KeyValueStore`]).
//! [`BookmarkStore`] keeps the whole bookmark collection under one key and
//! replaces it wholesale on every write, so each operation is a single
//! read-modify-write from the caller's point of view.
//!
//! There is no locking: two writers racing on the same key can lose an
//! update. Saves are user-driven and one at a time, which makes that an
//! accepted limitation.

use std::fmt::Debug;
use std::sync::Arc;

use serde_json::Value;

use crate::bookmark::Bookmark;
use crate::error::{Result, SaverError};

pub mod memory;
pub mod sled_store;

pub use memory::MemoryStore;
pub use sled_store::SledStore;

/// Persisted key holding the bookmark collection.
pub const BOOKMARKS_KEY: &str = "bookmarks";

/// Async get/set-by-key storage offered by the host
///
/// Values are JSON so every host persists the same shapes.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync + Debug {
    /// Read the value under `key`, `None` when it was never written.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Replace the value under `key`.
    async fn set(&self, key: &str, value: Value) -> Result<()>;
}

/// CRUD over the persisted bookmark collection
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use gpt_saver::bookmark::Bookmark;
/// use gpt_saver::storage::{BookmarkStore, MemoryStore};
///
/// # #[tokio::main]
/// # async fn main() -> gpt_saver::error::Result<()> {
/// let store = BookmarkStore::new(Arc::new(MemoryStore::new()));
/// let bm = Bookmark::capture("https://chatgpt.com/c/1", 0, "hello");
/// store.add(bm.clone()).await?;
/// assert_eq!(store.list().await?, vec![bm.clone()]);
/// store.remove(&bm.id).await?;
/// assert!(store.list().await?.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BookmarkStore {
    kv: Arc<dyn KeyValueStore>,
}

impl BookmarkStore {
    /// Wrap a host key-value store.
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// All stored bookmarks in persisted order (empty when none were saved).
    ///
    /// # Errors
    ///
    /// Returns `SaverError::Storage` if the read fails or the stored value is
    /// not a bookmark list.
    pub async fn list(&self) -> Result<Vec<Bookmark>> {
        match self.kv.get(BOOKMARKS_KEY).await? {
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value).map_err(|e| {
                SaverError::Storage(format!("Malformed bookmark collection: {}", e)).into()
            }),
        }
    }

    /// Append a bookmark and write the collection back.
    pub async fn add(&self, bookmark: Bookmark) -> Result<()> {
        let mut bookmarks = self.list().await?;
        tracing::debug!(id = %bookmark.id, total = bookmarks.len() + 1, "Adding bookmark");
        bookmarks.push(bookmark);
        self.write(&bookmarks).await
    }

    /// Remove the bookmark with `id`; an unknown id leaves the store as is.
    pub async fn remove(&self, id: &str) -> Result<()> {
        let bookmarks = self.list().await?;
        let before = bookmarks.len();
        let remaining: Vec<Bookmark> = bookmarks.into_iter().filter(|b| b.id != id).collect();
        tracing::debug!(id, removed = before - remaining.len(), "Removing bookmark");
        self.write(&remaining).await
    }

    /// Look up one bookmark by id.
    pub async fn find(&self, id: &str) -> Result<Option<Bookmark>> {
        Ok(self.list().await?.into_iter().find(|b| b.id == id))
    }

    /// Replace the whole collection.
    pub async fn replace_all(&self, bookmarks: &[Bookmark]) -> Result<()> {
        self.write(bookmarks).await
    }

    /// Underlying key-value store, shared with other persisted settings.
    pub fn kv(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.kv)
    }

    async fn write(&self, bookmarks: &[Bookmark]) -> Result<()> {
        let value = serde_json::to_value(bookmarks).map_err(SaverError::Serialization)?;
        self.kv.set(BOOKMARKS_KEY, value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bookmark(id: &str, created_at: i64) -> Bookmark {
        Bookmark {
            id: id.to_string(),
            conversation_url: "https://chatgpt.com/c/1".to_string(),
            index: 0,
            text_snippet: format!("snippet {}", id),
            created_at,
        }
    }

    fn store() -> (BookmarkStore, Arc<MemoryStore>) {
        let kv = Arc::new(MemoryStore::new());
        (BookmarkStore::new(kv.clone()), kv)
    }

    #[tokio::test]
    async fn test_list_is_empty_when_key_absent() {
        let (store, _) = store();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_appends_in_order() {
        let (store, _) = store();
        store.add(bookmark("a", 1)).await.unwrap();
        store.add(bookmark("b", 2)).await.unwrap();
        let ids: Vec<String> = store.list().await.unwrap().into_iter().map(|b| b.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_remove_only_target() {
        let (store, _) = store();
        for (id, t) in [("a", 1), ("b", 2), ("c", 3)] {
            store.add(bookmark(id, t)).await.unwrap();
        }
        store.remove("b").await.unwrap();
        let remaining = store.list().await.unwrap();
        assert_eq!(remaining, vec![bookmark("a", 1), bookmark("c", 3)]);
    }

    #[tokio::test]
    async fn test_remove_unknown_id_is_noop() {
        let (store, _) = store();
        store.add(bookmark("a", 1)).await.unwrap();
        store.remove("missing").await.unwrap();
        assert_eq!(store.list().await.unwrap(), vec![bookmark("a", 1)]);
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let (store, _) = store();
        store.add(bookmark("a", 1)).await.unwrap();
        assert_eq!(store.find("a").await.unwrap(), Some(bookmark("a", 1)));
        assert_eq!(store.find("z").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_persisted_shape_is_json_array_under_bookmarks_key() {
        let (store, kv) = store();
        store.add(bookmark("a", 7)).await.unwrap();
        let raw = kv.get(BOOKMARKS_KEY).await.unwrap().unwrap();
        assert_eq!(raw[0]["id"], "a");
        assert_eq!(raw[0]["createdAt"], 7);
    }

    #[tokio::test]
    async fn test_malformed_collection_is_storage_error() {
        let (store, kv) = store();
        kv.set(BOOKMARKS_KEY, json!({"not": "a list"})).await.unwrap();
        let err = store.list().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SaverError>(),
            Some(SaverError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn test_read_failure_propagates_and_aborts_write() {
        let (store, kv) = store();
        store.add(bookmark("a", 1)).await.unwrap();
        kv.fail_reads(true);
        assert!(store.add(bookmark("b", 2)).await.is_err());
        kv.fail_reads(false);
        assert_eq!(store.list().await.unwrap().len(), 1);
    }
}
