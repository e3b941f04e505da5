//! Durable key-value store on sled
//!
//! Each key maps to the JSON bytes of its value. Writes are flushed before
//! returning so a completed `set` survives a crash.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde_json::Value;
use sled::Db;

use crate::error::{Result, SaverError};
use crate::storage::KeyValueStore;

/// [`KeyValueStore`] backed by an embedded `sled` database
#[derive(Debug, Clone)]
pub struct SledStore {
    db: Db,
    path: PathBuf,
}

impl SledStore {
    /// Open or create a store at `path`.
    ///
    /// # Errors
    ///
    /// Returns `SaverError::Storage` if the database cannot be opened.
    ///
    /// # Examples
    ///
    /// ```
    /// use gpt_saver::storage::SledStore;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let store = SledStore::open(dir.path().join("bookmarks.sled")).unwrap();
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SaverError::Storage(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        let db = sled::open(&path)
            .map_err(|e| SaverError::Storage(format!("Failed to open database: {}", e)))?;
        tracing::debug!(path = %path.display(), "Opened bookmark database");
        Ok(Self { db, path })
    }

    /// Default database location in the user's data directory.
    pub fn default_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("com", "gpt-saver", "gpt-saver")
            .ok_or_else(|| SaverError::Storage("Could not determine data directory".into()))?;
        Ok(dirs.data_dir().join("bookmarks.sled"))
    }

    /// Where this store lives on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl KeyValueStore for SledStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        match self
            .db
            .get(key.as_bytes())
            .map_err(|e| SaverError::Storage(format!("Get failed: {}", e)))?
        {
            Some(bytes) => {
                let value = serde_json::from_slice(&bytes)
                    .map_err(|e| SaverError::Storage(format!("Deserialization failed: {}", e)))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let bytes = serde_json::to_vec(&value)
            .map_err(|e| SaverError::Storage(format!("Serialization failed: {}", e)))?;

        self.db
            .insert(key.as_bytes(), bytes)
            .map_err(|e| SaverError::Storage(format!("Insert failed: {}", e)))?;

        self.db
            .flush_async()
            .await
            .map_err(|e| SaverError::Storage(format!("Flush failed: {}", e)))?;

        Ok(())
    }
}
