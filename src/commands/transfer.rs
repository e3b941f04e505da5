//! Import and export of the bookmark collection
//!
//! Exports are the persisted JSON array as is. Imports also accept a whole
//! storage dump (`{"bookmarks": [...], "popupTheme": ...}`) so a browser
//! profile's extension storage can be loaded directly.

use std::collections::HashSet;
use std::path::Path;

use serde_json::Value;

use crate::bookmark::Bookmark;
use crate::error::{Result, SaverError};
use crate::storage::{BookmarkStore, BOOKMARKS_KEY};

/// Parse an export or a storage dump into bookmarks.
///
/// # Errors
///
/// Returns `SaverError::Serialization` if `content` is not JSON, and
/// `SaverError::InvalidBookmark` if the document holds neither.
pub fn parse_export(content: &str) -> Result<Vec<Bookmark>> {
    let value: Value = serde_json::from_str(content).map_err(SaverError::Serialization)?;
    let list = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => map.remove(BOOKMARKS_KEY).ok_or_else(|| {
            SaverError::InvalidBookmark(format!("No '{}' key in import", BOOKMARKS_KEY))
        })?,
        _ => {
            return Err(
                SaverError::InvalidBookmark("Import must be a JSON array".to_string()).into(),
            )
        }
    };
    serde_json::from_value(list)
        .map_err(|e| SaverError::InvalidBookmark(format!("Malformed bookmark: {}", e)).into())
}

/// Append the `incoming` bookmarks whose ids are not present yet.
///
/// Returns the merged list and how many were added.
pub fn merge(existing: Vec<Bookmark>, incoming: Vec<Bookmark>) -> (Vec<Bookmark>, usize) {
    let mut seen: HashSet<String> = existing.iter().map(|b| b.id.clone()).collect();
    let mut merged = existing;
    let mut added = 0;
    for bookmark in incoming {
        if seen.insert(bookmark.id.clone()) {
            merged.push(bookmark);
            added += 1;
        }
    }
    (merged, added)
}

/// Merge the bookmarks in `path` into `store`.
pub async fn import_file(store: &BookmarkStore, path: &Path) -> Result<usize> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(SaverError::Io)?;
    let incoming = parse_export(&content)?;
    let (merged, added) = merge(store.list().await?, incoming);
    store.replace_all(&merged).await?;
    tracing::info!(added, total = merged.len(), path = %path.display(), "Imported bookmarks");
    Ok(added)
}

/// Serialize every bookmark as a pretty-printed JSON array.
pub async fn export_json(store: &BookmarkStore) -> Result<String> {
    let bookmarks = store.list().await?;
    serde_json::to_string_pretty(&bookmarks).map_err(|e| SaverError::Serialization(e).into())
}
