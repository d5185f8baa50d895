//! Application configuration structures.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{NameFilter, SearchQuery};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// What to watch and how often
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Search endpoint and HTTP behavior
    #[serde(default)]
    pub fetcher: FetcherConfig,

    /// Notification channel settings
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// State file location
    #[serde(default)]
    pub storage: StorageConfig,

    /// Log verbosity
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load the startup configuration.
    ///
    /// Only an absent file that was not explicitly requested falls back to
    /// defaults. An unreadable, malformed or invalid file is a configuration
    /// error.
    pub fn load_or_default(path: impl AsRef<Path>, required: bool) -> Result<Self> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound && !required => {
                log::debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(AppError::config(format!("reading {}: {e}", path.display())));
            }
        };

        let config: Self = toml::from_str(&content)
            .map_err(|e| AppError::config(format!("parsing {}: {e}", path.display())))?;
        config
            .validate()
            .map_err(|e| AppError::config(format!("{}: {e}", path.display())))?;
        Ok(config)
    }

    /// Validate configuration values for basic sanity.
    ///
    /// The search query is checked separately through
    /// [`MonitorConfig::search_query`] so that commands which never run a
    /// pass can still validate the rest of the file.
    pub fn validate(&self) -> Result<()> {
        if self.monitor.interval_secs == 0 {
            return Err(AppError::validation("monitor.interval_secs must be > 0"));
        }
        if self.fetcher.timeout_ms == 0 {
            return Err(AppError::validation("fetcher.timeout_ms must be > 0"));
        }
        if self.notifier.timeout_secs == 0 {
            return Err(AppError::validation("notifier.timeout_secs must be > 0"));
        }
        if self.fetcher.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetcher.user_agent is empty"));
        }
        Url::parse(&self.fetcher.endpoint)
            .map_err(|e| AppError::validation(format!("fetcher.endpoint: {e}")))?;
        Url::parse(&self.notifier.api_base)
            .map_err(|e| AppError::validation(format!("notifier.api_base: {e}")))?;
        if self.storage.state_file.trim().is_empty() {
            return Err(AppError::validation("storage.state_file is empty"));
        }
        Ok(())
    }
}

/// Query, filter and polling interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Search query sent to the catalog (required before any pass runs)
    #[serde(default)]
    pub query: Option<String>,

    /// Optional case-insensitive substring filter over item names
    #[serde(default)]
    pub filter: Option<String>,

    /// Seconds between passes in continuous mode
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,
}

impl MonitorConfig {
    /// The configured query, or a configuration error when it is missing.
    pub fn search_query(&self) -> Result<SearchQuery> {
        SearchQuery::new(self.query.as_deref().unwrap_or_default())
    }

    /// The configured name filter, if any non-empty one is set.
    pub fn name_filter(&self) -> Option<NameFilter> {
        self.filter.as_deref().and_then(NameFilter::new)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            query: None,
            filter: None,
            interval_secs: defaults::interval(),
        }
    }
}

/// Catalog search endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Search endpoint URL (query parameters are appended)
    #[serde(default = "defaults::endpoint")]
    pub endpoint: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Hard timeout for one search request, in milliseconds
    #[serde(default = "defaults::timeout_ms")]
    pub timeout_ms: u64,

    /// Referer header sent with each search
    #[serde(default = "defaults::referer")]
    pub referer: String,

    /// Accept-Language header sent with each search
    #[serde(default = "defaults::accept_language")]
    pub accept_language: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::endpoint(),
            user_agent: defaults::user_agent(),
            timeout_ms: defaults::timeout_ms(),
            referer: defaults::referer(),
            accept_language: defaults::accept_language(),
        }
    }
}

/// Discord delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Discord REST API base
    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    /// Channel that receives the announcements
    #[serde(default)]
    pub channel_id: Option<String>,

    /// Environment variable holding the bot token
    #[serde(default = "defaults::token_env")]
    pub token_env: String,

    /// Prefix for item detail links
    #[serde(default = "defaults::product_url_base")]
    pub product_url_base: String,

    /// Prefix for item image paths
    #[serde(default = "defaults::media_url_base")]
    pub media_url_base: String,

    /// Value substituted for `{{size}}` in image paths
    #[serde(default = "defaults::image_size")]
    pub image_size: String,

    /// Timeout for one delivery, in seconds
    #[serde(default = "defaults::notify_timeout")]
    pub timeout_secs: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            api_base: defaults::api_base(),
            channel_id: None,
            token_env: defaults::token_env(),
            product_url_base: defaults::product_url_base(),
            media_url_base: defaults::media_url_base(),
            image_size: defaults::image_size(),
            timeout_secs: defaults::notify_timeout(),
        }
    }
}

/// Persisted state location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// File name of the catalog document, relative to the storage directory
    #[serde(default = "defaults::state_file")]
    pub state_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_file: defaults::state_file(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level when RUST_LOG is unset
    #[serde(default = "defaults::level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::level(),
        }
    }
}

mod defaults {
    // Monitor defaults
    pub fn interval() -> u64 {
        60
    }

    // Fetcher defaults
    pub fn endpoint() -> String {
        "https://api-online.myer.com.au/v3/product/search".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36"
            .into()
    }
    pub fn timeout_ms() -> u64 {
        1000
    }
    pub fn referer() -> String {
        "https://www.myer.com.au/".into()
    }
    pub fn accept_language() -> String {
        "en-GB,en-US;q=0.9,en;q=0.8".into()
    }

    // Notifier defaults
    pub fn api_base() -> String {
        "https://discord.com/api/v10".into()
    }
    pub fn token_env() -> String {
        "DISCORD_BOT_SECRET".into()
    }
    pub fn product_url_base() -> String {
        "https://www.myer.com.au/p".into()
    }
    pub fn media_url_base() -> String {
        "https://myer-media.com.au/wcsstore/MyerCatalogAssetStore".into()
    }
    pub fn image_size() -> String {
        "720x928".into()
    }
    pub fn notify_timeout() -> u64 {
        10
    }

    // Storage defaults
    pub fn state_file() -> String {
        "catalog.json".into()
    }

    // Logging defaults
    pub fn level() -> String {
        "info".into()
    }
}
