// src/services/notifier.rs

//! Discord notifier.
//!
//! Announces one item per message as a rich embed posted through the bot API.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::{Value, json};

use crate::error::{AppError, Result};
use crate::models::{NotifierConfig, SnapshotItem};
use crate::utils::http::create_notifier_client;
use crate::utils::join_path;

/// Embed accent colour.
const EMBED_COLOR: u32 = 0x0099ff;

/// Delivery channel for availability announcements.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one announcement for an item that just became available.
    async fn notify(&self, item: &SnapshotItem) -> Result<()>;
}

/// Posts embeds to a Discord channel.
pub struct DiscordNotifier {
    client: Client,
    messages_url: String,
    token: String,
    config: NotifierConfig,
}

impl DiscordNotifier {
    /// Create a notifier with an explicit bot token.
    pub fn new(config: &NotifierConfig, token: impl Into<String>) -> Result<Self> {
        let channel_id = config
            .channel_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AppError::config("notifier.channel_id is required to send messages"))?;

        let token = token.into();
        if token.trim().is_empty() {
            return Err(AppError::config("Discord bot token is empty"));
        }

        Ok(Self {
            client: create_notifier_client(config)?,
            messages_url: join_path(&config.api_base, &format!("channels/{channel_id}/messages")),
            token,
            config: config.clone(),
        })
    }

    /// Create a notifier reading the bot token from `config.token_env`.
    pub fn from_env(config: &NotifierConfig) -> Result<Self> {
        let token = std::env::var(&config.token_env).map_err(|_| {
            AppError::config(format!(
                "Environment variable {} with the Discord bot token is not set",
                config.token_env
            ))
        })?;
        Self::new(config, token)
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn notify(&self, item: &SnapshotItem) -> Result<()> {
        let body = json!({ "embeds": [render_embed(item, &self.config)] });

        let response = self
            .client
            .post(&self.messages_url)
            .header("Authorization", format!("Bot {}", self.token))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::notification(&item.id, e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::notification(
                &item.id,
                format!("HTTP status {}: {}", status.as_u16(), detail.trim()),
            ));
        }
        Ok(())
    }
}

/// Render the embed announcing an item.
pub fn render_embed(item: &SnapshotItem, config: &NotifierConfig) -> Value {
    let mut embed = json!({
        "title": item.name,
        "url": join_path(&config.product_url_base, &item.detail_token),
        "color": EMBED_COLOR,
        "fields": [{
            "name": "Price",
            "value": item.price.display(),
            "inline": true,
        }],
        "timestamp": Utc::now().to_rfc3339(),
    });

    if let Some(media) = item.primary_media() {
        embed["thumbnail"] = json!({
            "url": join_path(&config.media_url_base, &media.sized(&config.image_size)),
        });
    }

    embed
}
