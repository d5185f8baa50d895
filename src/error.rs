// src/error.rs

//! Unified error handling for the stock monitor.

use std::fmt;

use thiserror::Error;

/// Result type alias for monitor operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error, fatal at startup
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration value out of range
    #[error("Validation error: {0}")]
    Validation(String),

    /// Snapshot fetch failed (network, timeout or non-success status)
    #[error("Fetch error for query '{query}': {message}")]
    Fetch { query: String, message: String },

    /// State store unreachable or write rejected
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Delivery of a single notification failed
    #[error("Notification error for item {item_id}: {message}")]
    Notification { item_id: String, message: String },
}

/// Coarse classification used at the pass boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Fetch,
    Persistence,
    Notification,
    Other,
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a fetch error for the given query.
    pub fn fetch(query: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            query: query.into(),
            message: message.to_string(),
        }
    }

    /// Create a persistence error.
    pub fn persistence(message: impl fmt::Display) -> Self {
        Self::Persistence(message.to_string())
    }

    /// Create a notification error for a single item.
    pub fn notification(item_id: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Notification {
            item_id: item_id.into(),
            message: message.to_string(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Toml(_) | Self::Url(_) => {
                ErrorKind::Configuration
            }
            Self::Fetch { .. } => ErrorKind::Fetch,
            Self::Persistence(_) => ErrorKind::Persistence,
            Self::Notification { .. } => ErrorKind::Notification,
            Self::Io(_) | Self::Json(_) => ErrorKind::Other,
        }
    }
}
