// src/lambda/mod.rs

//! AWS Lambda handler for the monitor.
//!
//! Each invocation is one pass, normally triggered by a one-minute schedule:
//! 1. Loads the catalog document from S3
//! 2. Searches for the configured query
//! 3. Commits availability changes back to S3
//! 4. Announces newly available items (unless seeding)
//!
//! Passes must not overlap, so the function is deployed with a reserved
//! concurrency of one.

use std::sync::Arc;

use lambda_runtime::{Error as LambdaError, LambdaEvent};

use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::error::Result;
use crate::models::Config;
use crate::pipeline::{PassMode, PassRequest, ReconcileOutcome, Reconciler};
use crate::services::{DiscordNotifier, SearchClient};
use crate::storage::S3Storage;

/// Lambda invocation payload.
///
/// Scheduled events carry none of these fields, which then fall back to the
/// environment.
#[derive(Debug, Default, Deserialize)]
pub struct MonitorRequest {
    /// Record availability without announcing anything
    #[serde(default)]
    pub seed: bool,

    /// Search query (overrides `SEARCH_QUERY`)
    pub query: Option<String>,

    /// Name filter (overrides `NAME_FILTER`)
    pub filter: Option<String>,
}

/// Lambda response payload.
#[derive(Debug, Default, Serialize)]
pub struct MonitorResponse {
    /// Whether the pass completed
    pub success: bool,

    /// Items returned by the search
    pub fetched: usize,

    /// Items that passed the name filter
    pub matched: usize,

    /// Catalog entries written
    pub written: usize,

    /// Announcements delivered
    pub notified: usize,

    /// Announcements that failed
    pub notify_failures: usize,

    /// Error message if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Execution time in milliseconds
    pub execution_time_ms: u64,
}

impl MonitorResponse {
    fn from_outcome(outcome: &ReconcileOutcome) -> Self {
        let mut response = Self {
            success: true,
            ..Default::default()
        };
        match outcome {
            ReconcileOutcome::NoResults => {}
            ReconcileOutcome::NoMatches { fetched } => response.fetched = *fetched,
            ReconcileOutcome::Applied(report) => {
                response.fetched = report.fetched;
                response.matched = report.matched;
                response.written = report.write_set.len();
                response.notified = report.dispatch.delivered;
                response.notify_failures = report.dispatch.failed;
            }
        }
        response
    }
}

/// Main Lambda handler function.
#[instrument(skip(event))]
pub async fn handler(
    event: LambdaEvent<MonitorRequest>,
) -> std::result::Result<MonitorResponse, LambdaError> {
    let start = std::time::Instant::now();
    let (request, _context) = event.into_parts();

    info!(
        "Starting pass: seed={}, query={:?}, filter={:?}",
        request.seed, request.query, request.filter
    );

    match run_pass(request).await {
        Ok(outcome) => {
            let mut response = MonitorResponse::from_outcome(&outcome);
            response.execution_time_ms = start.elapsed().as_millis() as u64;
            info!(
                "Pass completed: {} fetched, {} written, {} notified in {}ms",
                response.fetched, response.written, response.notified, response.execution_time_ms
            );
            Ok(response)
        }
        Err(e) => {
            error!("Pass failed ({:?}): {}", e.kind(), e);
            Ok(MonitorResponse {
                success: false,
                error: Some(e.to_string()),
                execution_time_ms: start.elapsed().as_millis() as u64,
                ..Default::default()
            })
        }
    }
}

/// Internal pass logic.
async fn run_pass(request: MonitorRequest) -> Result<ReconcileOutcome> {
    let mut config = load_lambda_config()?;
    if let Some(query) = request.query {
        config.monitor.query = Some(query);
    }
    if let Some(filter) = request.filter {
        config.monitor.filter = Some(filter);
    }

    let mode = if request.seed {
        PassMode::Seed
    } else {
        PassMode::Notify
    };
    let pass = PassRequest::new(
        config.monitor.search_query()?,
        config.monitor.name_filter(),
        mode,
    );

    let storage = S3Storage::from_env()
        .await?
        .with_state_file(config.storage.state_file.clone());
    let storage = Arc::new(storage);
    let fetcher = Arc::new(SearchClient::new(&config.fetcher)?);
    let mut reconciler = Reconciler::new(fetcher, storage);
    if mode == PassMode::Notify {
        reconciler = reconciler.with_notifier(Arc::new(DiscordNotifier::from_env(
            &config.notifier,
        )?));
    }

    reconciler.run(&pass).await
}

/// Load configuration suitable for Lambda environment.
fn load_lambda_config() -> Result<Config> {
    let mut config = Config::default();
    apply_env(&mut config, |key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

/// Override defaults from environment-style lookups.
fn apply_env(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(query) = var("SEARCH_QUERY") {
        config.monitor.query = Some(query);
    }
    if let Some(filter) = var("NAME_FILTER") {
        config.monitor.filter = Some(filter);
    }
    if let Some(endpoint) = var("SEARCH_ENDPOINT") {
        config.fetcher.endpoint = endpoint;
    }
    if let Some(ms) = var("FETCH_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
        config.fetcher.timeout_ms = ms;
    }
    if let Some(channel) = var("DISCORD_CHANNEL_ID") {
        config.notifier.channel_id = Some(channel);
    }
    if let Some(state_file) = var("STATE_FILE") {
        config.storage.state_file = state_file;
    }
}
