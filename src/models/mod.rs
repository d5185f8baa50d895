// src/models/mod.rs

//! Domain models for the stock monitor.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod catalog;
mod config;
mod item;
mod query;

// Re-export all public types
pub use catalog::{CatalogCounts, CatalogEntry, CatalogState, apply_batch};
pub use config::{
    Config, FetcherConfig, LoggingConfig, MonitorConfig, NotifierConfig, StorageConfig,
};
pub use item::{Media, PriceRange, SnapshotItem};
pub use query::{NameFilter, SearchQuery};
