// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER};

use crate::error::{AppError, Result};
use crate::models::{FetcherConfig, NotifierConfig};

/// Create the client used for catalog searches.
///
/// Carries the browser-like headers the search endpoint expects and the
/// per-request timeout from the fetcher settings.
pub fn create_search_client(config: &FetcherConfig) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT_LANGUAGE, header_value("accept_language", &config.accept_language)?);
    headers.insert(REFERER, header_value("referer", &config.referer)?);

    reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(headers)
        .timeout(Duration::from_millis(config.timeout_ms))
        .build()
        .map_err(|e| AppError::config(format!("Failed to build search client: {e}")))
}

/// Create the client used for notification delivery.
pub fn create_notifier_client(config: &NotifierConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("stockwatch/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| AppError::config(format!("Failed to build notifier client: {e}")))
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| AppError::validation(format!("fetcher.{name} is not a valid header: {e}")))
}
