//! Storage abstractions for catalog availability.
//!
//! The whole catalog lives in one JSON document so that a batch upsert is a
//! single replace of that document:
//!
//! ```text
//! storage/
//! ├── config.toml           # Monitor configuration
//! └── catalog.json          # item id -> in stock
//! ```

pub mod local;
#[cfg(feature = "s3")]
pub mod s3;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{CatalogEntry, CatalogState, apply_batch};

// Re-export for convenience
pub use local::LocalStorage;
#[cfg(feature = "s3")]
pub use s3::S3Storage;

/// On-disk shape of the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogDocument {
    /// Time of the last committed batch
    pub updated_at: DateTime<Utc>,
    /// Number of known identifiers
    pub count: usize,
    /// Availability by identifier
    pub entries: BTreeMap<String, bool>,
}

impl CatalogDocument {
    pub fn new(entries: CatalogState) -> Self {
        Self {
            updated_at: Utc::now(),
            count: entries.len(),
            entries,
        }
    }

    /// Merge a batch into the current entries and restamp the document.
    pub fn merged(mut entries: CatalogState, batch: &[CatalogEntry]) -> Self {
        apply_batch(&mut entries, batch);
        Self::new(entries)
    }
}

/// Persisted catalog state.
///
/// Implementations must make `upsert_batch` all-or-nothing: after an error the
/// stored state is exactly what it was before the call.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read every known identifier and its availability.
    async fn read_all(&self) -> Result<CatalogState>;

    /// Insert absent identifiers and overwrite the flag of existing ones.
    async fn upsert_batch(&self, batch: &[CatalogEntry]) -> Result<()>;

    /// Human-readable location, for logs.
    fn location(&self) -> String;
}
