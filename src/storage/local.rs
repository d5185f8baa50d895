//! Local filesystem storage implementation.
//!
//! The catalog document is rewritten in full on every batch through a temp
//! file followed by a rename, so readers only ever see a complete document.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{CatalogEntry, CatalogState};
use crate::storage::{CatalogDocument, StateStore};

/// Default document name inside the storage directory.
pub const DEFAULT_STATE_FILE: &str = "catalog.json";

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    state_file: String,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self::with_state_file(root_dir, DEFAULT_STATE_FILE)
    }

    /// Create a LocalStorage with a custom document name.
    pub fn with_state_file(root_dir: impl Into<PathBuf>, state_file: impl Into<String>) -> Self {
        Self {
            root_dir: root_dir.into(),
            state_file: state_file.into(),
        }
    }

    /// Full path of the catalog document.
    pub fn state_path(&self) -> PathBuf {
        self.path(&self.state_file)
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Parse the catalog document, `None` before the first commit.
    async fn load_document(&self) -> Result<Option<CatalogDocument>> {
        let Some(bytes) = self.read_bytes(&self.state_file).await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }
}

#[async_trait]
impl StateStore for LocalStorage {
    async fn read_all(&self) -> Result<CatalogState> {
        match self.load_document().await {
            Ok(Some(doc)) => Ok(doc.entries),
            Ok(None) => {
                log::debug!("No {} found, starting empty", self.state_file);
                Ok(CatalogState::new())
            }
            Err(e) => Err(AppError::persistence(format!(
                "reading {}: {e}",
                self.state_path().display()
            ))),
        }
    }

    async fn upsert_batch(&self, batch: &[CatalogEntry]) -> Result<()> {
        let current = self.read_all().await?;
        let doc = CatalogDocument::merged(current, batch);

        self.write_json(&self.state_file, &doc).await.map_err(|e| {
            AppError::persistence(format!("writing {}: {e}", self.state_path().display()))
        })?;

        log::debug!(
            "Committed {} upserts, {} identifiers in {}",
            batch.len(),
            doc.count,
            self.state_file
        );
        Ok(())
    }

    fn location(&self) -> String {
        self.state_path().display().to_string()
    }
}
