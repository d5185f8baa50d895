//! In-memory collaborators for pipeline tests.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{
    CatalogEntry, CatalogState, PriceRange, SearchQuery, SnapshotItem, apply_batch,
};
use crate::services::{Notifier, SnapshotFetcher};
use crate::storage::StateStore;

pub fn item(id: &str, name: &str) -> SnapshotItem {
    SnapshotItem {
        id: id.to_string(),
        name: name.to_string(),
        price: PriceRange::new(20.0, 20.0),
        media: Vec::new(),
        detail_token: format!("p-{}", id),
    }
}

/// Returns a fixed listing, or fails every call.
#[derive(Default)]
pub struct FakeFetcher {
    listing: Mutex<Vec<SnapshotItem>>,
    fail: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl FakeFetcher {
    pub fn listing(items: Vec<SnapshotItem>) -> Self {
        Self {
            listing: Mutex::new(items),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn slow(items: Vec<SnapshotItem>, delay: Duration) -> Self {
        Self {
            listing: Mutex::new(items),
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn set_listing(&self, items: Vec<SnapshotItem>) {
        *self.listing.lock().unwrap() = items;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotFetcher for FakeFetcher {
    async fn fetch(&self, query: &SearchQuery) -> Result<Vec<SnapshotItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(AppError::fetch(query.as_str(), "connection refused"));
        }
        Ok(self.listing.lock().unwrap().clone())
    }
}

/// Map-backed store that can be told to reject writes.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<CatalogState>,
    fail_writes: bool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn with_state(state: CatalogState) -> Self {
        Self {
            state: Mutex::new(state),
            ..Self::default()
        }
    }

    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> CatalogState {
        self.state.lock().unwrap().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn read_all(&self) -> Result<CatalogState> {
        Ok(self.snapshot())
    }

    async fn upsert_batch(&self, batch: &[CatalogEntry]) -> Result<()> {
        if self.fail_writes {
            return Err(AppError::persistence("database unavailable"));
        }
        apply_batch(&mut self.state.lock().unwrap(), batch);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

/// Records every attempt; fails for the configured identifiers.
#[derive(Default)]
pub struct RecordingNotifier {
    attempted: Mutex<Vec<String>>,
    delivered: Mutex<Vec<String>>,
    fail_ids: HashSet<String>,
}

impl RecordingNotifier {
    pub fn failing_for(ids: &[&str]) -> Self {
        Self {
            fail_ids: ids.iter().map(|id| id.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn attempted(&self) -> Vec<String> {
        self.attempted.lock().unwrap().clone()
    }

    pub fn delivered(&self) -> Vec<String> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, item: &SnapshotItem) -> Result<()> {
        self.attempted.lock().unwrap().push(item.id.clone());
        if self.fail_ids.contains(&item.id) {
            return Err(AppError::notification(&item.id, "HTTP status 500"));
        }
        self.delivered.lock().unwrap().push(item.id.clone());
        Ok(())
    }
}
