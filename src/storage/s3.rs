//! AWS S3 storage implementation.
//!
//! The catalog document lives at `s3://{bucket}/{prefix}/{state_file}`
//! (`catalog.json` unless configured otherwise).
//! A batch is committed with a single `PutObject`, which S3 applies
//! atomically: readers see either the old or the new document.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;

use crate::error::{AppError, Result};
use crate::models::{CatalogEntry, CatalogState};
use crate::storage::local::DEFAULT_STATE_FILE;
use crate::storage::{CatalogDocument, StateStore};

/// S3-backed catalog store.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    prefix: String,
    state_file: String,
}

impl S3Storage {
    /// Create a new S3 storage instance.
    pub fn new(client: Client, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix: prefix.into(),
            state_file: DEFAULT_STATE_FILE.to_string(),
        }
    }

    /// Use a custom document name under the prefix.
    pub fn with_state_file(mut self, state_file: impl Into<String>) -> Self {
        self.state_file = state_file.into();
        self
    }

    /// Create S3 storage from environment configuration.
    ///
    /// - `S3_BUCKET`: bucket name (default: `stockwatch-state`)
    /// - `S3_PREFIX`: key prefix (default: `stockwatch`)
    pub async fn from_env() -> Result<Self> {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let client = Client::new(&config);

        let bucket = std::env::var("S3_BUCKET").unwrap_or_else(|_| "stockwatch-state".to_string());
        let prefix = std::env::var("S3_PREFIX").unwrap_or_else(|_| "stockwatch".to_string());

        Ok(Self::new(client, bucket, prefix))
    }

    fn key(&self) -> String {
        object_key(&self.prefix, &self.state_file)
    }

    /// Read an object, returning None if the key doesn't exist.
    async fn read_bytes_optional(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let bytes = output.body.collect().await.map_err(|e| {
                    AppError::persistence(format!("reading s3://{}/{}: {e}", self.bucket, key))
                })?;
                Ok(Some(bytes.into_bytes().to_vec()))
            }
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    log::info!("No existing state at s3://{}/{}", self.bucket, key);
                    Ok(None)
                } else {
                    Err(AppError::persistence(format!(
                        "reading s3://{}/{}: {service_err}",
                        self.bucket, key
                    )))
                }
            }
        }
    }

    async fn write_bytes(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type("application/json")
            .send()
            .await
            .map_err(|e| {
                AppError::persistence(format!("writing s3://{}/{}: {e}", self.bucket, key))
            })?;
        Ok(())
    }
}

#[async_trait]
impl StateStore for S3Storage {
    async fn read_all(&self) -> Result<CatalogState> {
        let key = self.key();
        match self.read_bytes_optional(&key).await? {
            Some(bytes) => {
                let doc: CatalogDocument = serde_json::from_slice(&bytes).map_err(|e| {
                    AppError::persistence(format!("decoding s3://{}/{}: {e}", self.bucket, key))
                })?;
                Ok(doc.entries)
            }
            None => Ok(CatalogState::new()),
        }
    }

    async fn upsert_batch(&self, batch: &[CatalogEntry]) -> Result<()> {
        let key = self.key();
        let current = self.read_all().await?;
        let doc = CatalogDocument::merged(current, batch);
        let json = serde_json::to_vec_pretty(&doc)?;

        self.write_bytes(&key, json).await?;
        log::info!(
            "Committed {} upserts to s3://{}/{} ({} identifiers)",
            batch.len(),
            self.bucket,
            key,
            doc.count
        );
        Ok(())
    }

    fn location(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key())
    }
}

/// Object key of the catalog document under a prefix.
fn object_key(prefix: &str, state_file: &str) -> String {
    let prefix = prefix.trim_matches('/');
    let state_file = state_file.trim_start_matches('/');
    if prefix.is_empty() {
        state_file.to_string()
    } else {
        format!("{}/{}", prefix, state_file)
    }
}
