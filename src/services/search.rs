// src/services/search.rs

//! Catalog search client.
//!
//! Fetches the current listing for a query. The remote payload is treated as
//! untrusted: every field except the identifier may be absent or null.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{FetcherConfig, Media, PriceRange, SearchQuery, SnapshotItem};
use crate::utils::http::create_search_client;

/// Source of search snapshots.
#[async_trait]
pub trait SnapshotFetcher: Send + Sync {
    /// Return every item currently listed for the query, in listing order.
    async fn fetch(&self, query: &SearchQuery) -> Result<Vec<SnapshotItem>>;
}

/// HTTP search client for the catalog API.
pub struct SearchClient {
    client: Client,
    endpoint: Url,
    timeout: Duration,
}

impl SearchClient {
    /// Create a new search client with the given configuration.
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)?;
        Ok(Self {
            client: create_search_client(config)?,
            endpoint,
            timeout: Duration::from_millis(config.timeout_ms),
        })
    }

    /// Full request URL for a query.
    pub fn search_url(&self, query: &SearchQuery) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("query", query.as_str())
            .append_pair("pageNumber", "1")
            .append_pair("facets", "")
            .append_pair("sort", "recentlyAdded")
            .append_pair("variants", "");
        url
    }

    async fn request(&self, query: &SearchQuery) -> Result<SearchResponse> {
        let url = self.search_url(query);
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::fetch(query.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::fetch(
                query.as_str(),
                format!("HTTP status {}", status.as_u16()),
            ));
        }

        response
            .json::<SearchResponse>()
            .await
            .map_err(|e| AppError::fetch(query.as_str(), format!("invalid body: {e}")))
    }
}

#[async_trait]
impl SnapshotFetcher for SearchClient {
    async fn fetch(&self, query: &SearchQuery) -> Result<Vec<SnapshotItem>> {
        // Bound the whole exchange, body included; dropping the future cancels it.
        let response = match tokio::time::timeout(self.timeout, self.request(query)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(AppError::fetch(
                    query.as_str(),
                    format!("timed out after {}ms", self.timeout.as_millis()),
                ));
            }
        };

        Ok(response.into_items())
    }
}

/// Search response body. Only the product list is used.
///
/// Products are kept as raw values so that one malformed entry is dropped on
/// its own instead of failing the whole listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    product_list: Option<Vec<Value>>,
}

impl SearchResponse {
    fn into_items(self) -> Vec<SnapshotItem> {
        let products = self.product_list.unwrap_or_default();
        let total = products.len();
        let mut malformed = 0;

        let items: Vec<SnapshotItem> = products
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<Product>(raw) {
                Ok(product) => product.into_item(),
                Err(e) => {
                    malformed += 1;
                    log::warn!("Skipping malformed product: {}", e);
                    None
                }
            })
            .collect();

        let missing_id = total - items.len() - malformed;
        if missing_id > 0 {
            log::warn!("Dropped {} listed products without an identifier", missing_id);
        }
        items
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Product {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    price_from: Option<Value>,
    #[serde(default)]
    price_to: Option<Value>,
    #[serde(default)]
    media: Option<Vec<ProductMedia>>,
    #[serde(default)]
    seo_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductMedia {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl Product {
    fn into_item(self) -> Option<SnapshotItem> {
        let id = match self.id? {
            Value::String(s) if !s.trim().is_empty() => s,
            Value::Number(n) => n.to_string(),
            _ => return None,
        };

        let price_to = self.price_to.as_ref().and_then(price_value);
        let from = self
            .price_from
            .as_ref()
            .and_then(price_value)
            .or(price_to)
            .unwrap_or_default();
        let to = price_to.unwrap_or(from);

        let media = self
            .media
            .unwrap_or_default()
            .into_iter()
            .filter_map(|m| {
                m.base_url.map(|base_url| Media {
                    base_url,
                    description: m.description.unwrap_or_default(),
                })
            })
            .collect();

        Some(SnapshotItem {
            name: self.name.unwrap_or_else(|| id.clone()),
            id,
            price: PriceRange::new(from, to),
            media,
            detail_token: self.seo_token.unwrap_or_default(),
        })
    }
}

/// A price given as a JSON number or a numeric string.
fn price_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer, timeout_ms: u64) -> SearchClient {
        let config = FetcherConfig {
            endpoint: server.url("/v3/product/search"),
            timeout_ms,
            ..FetcherConfig::default()
        };
        SearchClient::new(&config).unwrap()
    }

    #[test]
    fn test_parse_tolerates_missing_fields() {
        let body = json!({
            "productList": [
                {
                    "id": "1001",
                    "name": "Red Shoe",
                    "priceFrom": 49.95,
                    "priceTo": 59.95,
                    "media": [{ "baseUrl": "a/{{size}}/b.jpg", "description": "front" }],
                    "seoToken": "red-shoe-1001"
                },
                { "id": 1002, "name": null, "media": null },
                { "name": "No id" },
                { "id": "", "name": "Blank id" }
            ]
        });
        let response: SearchResponse = serde_json::from_value(body).unwrap();
        let items = response.into_items();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "1001");
        assert_eq!(items[0].price, PriceRange::new(49.95, 59.95));
        assert_eq!(items[0].media[0].sized("720x928"), "a/720x928/b.jpg");
        assert_eq!(items[0].detail_token, "red-shoe-1001");
        assert_eq!(items[1].id, "1002");
        assert_eq!(items[1].name, "1002");
        assert!(items[1].media.is_empty());
    }

    #[test]
    fn test_malformed_product_does_not_sink_listing() {
        let body = json!({
            "productList": [
                { "id": "1", "name": "Red Shoe", "priceFrom": 10, "priceTo": 10 },
                { "id": "2", "name": "Blue Shoe", "priceFrom": "12.00", "priceTo": "15.50" },
                { "id": "3", "name": 42 },
                "not a product",
                { "id": "4", "name": "Green Shoe", "priceFrom": { "amount": 9 } }
            ]
        });
        let response: SearchResponse = serde_json::from_value(body).unwrap();
        let items = response.into_items();

        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "4"]);
        assert_eq!(items[0].price, PriceRange::new(10.0, 10.0));
        assert_eq!(items[1].price, PriceRange::new(12.0, 15.5));
        assert_eq!(items[2].price, PriceRange::new(0.0, 0.0));
    }

    #[test]
    fn test_missing_product_list_is_empty() {
        let response: SearchResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.into_items().is_empty());

        let response: SearchResponse =
            serde_json::from_value(json!({ "productList": null })).unwrap();
        assert!(response.into_items().is_empty());
    }

    #[tokio::test]
    async fn test_search_url_carries_query() {
        let server = MockServer::start_async().await;
        let client = client_for(&server, 1000);
        let url = client.search_url(&SearchQuery::new("labubu").unwrap());

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("query".into(), "labubu".into())));
        assert!(pairs.contains(&("sort".into(), "recentlyAdded".into())));
        assert!(pairs.contains(&("pageNumber".into(), "1".into())));
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v3/product/search")
                    .query_param("query", "shoe");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "productList": [
                            { "id": "1", "name": "Red Shoe", "priceFrom": 10, "priceTo": 10 },
                            { "id": "2", "name": "Blue Shoe", "priceFrom": 12, "priceTo": 15 }
                        ]
                    }));
            })
            .await;

        let client = client_for(&server, 1000);
        let items = client
            .fetch(&SearchQuery::new("shoe").unwrap())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Red Shoe");
        assert_eq!(items[1].price.display(), "$12 - $15");
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v3/product/search");
                then.status(503);
            })
            .await;

        let client = client_for(&server, 1000);
        let err = client
            .fetch(&SearchQuery::new("shoe").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Fetch { .. }));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v3/product/search");
                then.status(200)
                    .delay(Duration::from_millis(500))
                    .json_body(json!({ "productList": [] }));
            })
            .await;

        let client = client_for(&server, 50);
        let err = client
            .fetch(&SearchQuery::new("shoe").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Fetch { .. }));
    }

    #[tokio::test]
    async fn test_fetch_invalid_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v3/product/search");
                then.status(200).body("<html>maintenance</html>");
            })
            .await;

        let client = client_for(&server, 1000);
        let err = client
            .fetch(&SearchQuery::new("shoe").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Fetch { .. }));
    }
}
