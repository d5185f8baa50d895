//! Search query and name filter.

use std::fmt;

use crate::error::{AppError, Result};

/// A non-empty catalog search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery(String);

impl SearchQuery {
    /// Build a query, rejecting blank input as a configuration error.
    pub fn new(query: impl Into<String>) -> Result<Self> {
        let query = query.into();
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(AppError::config(
                "Search query is required. Use --search-query or set monitor.query.",
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Case-insensitive substring match over item display names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameFilter {
    raw: String,
    needle: String,
}

impl NameFilter {
    /// Build a filter. An empty needle means "no filter" and yields `None`.
    pub fn new(needle: &str) -> Option<Self> {
        if needle.is_empty() {
            return None;
        }
        Some(Self {
            raw: needle.to_string(),
            needle: needle.to_lowercase(),
        })
    }

    /// Whether the given name contains the needle, ignoring case.
    pub fn matches(&self, name: &str) -> bool {
        name.to_lowercase().contains(&self.needle)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for NameFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
