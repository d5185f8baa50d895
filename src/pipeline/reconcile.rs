// src/pipeline/reconcile.rs

//! Availability reconciliation pass.
//!
//! One pass reads the stored catalog, fetches the current listing, plans the
//! transitions, commits them as a single batch and only then announces items
//! that became available. Passes must not run concurrently; the scheduler
//! serializes them.

use std::sync::Arc;

use crate::error::Result;
use crate::models::{CatalogEntry, NameFilter, SearchQuery, SnapshotItem};
use crate::pipeline::diff::{Transition, plan_pass};
use crate::services::{Notifier, SnapshotFetcher};
use crate::storage::StateStore;

/// Whether a pass announces what it finds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassMode {
    /// Commit state and announce newly available items
    Notify,
    /// Commit state only; used to seed the catalog
    Seed,
}

/// Everything needed to run one pass.
#[derive(Debug, Clone)]
pub struct PassRequest {
    pub query: SearchQuery,
    pub filter: Option<NameFilter>,
    pub mode: PassMode,
}

impl PassRequest {
    pub fn new(query: SearchQuery, filter: Option<NameFilter>, mode: PassMode) -> Self {
        Self {
            query,
            filter,
            mode,
        }
    }
}

/// Notification delivery tally for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub delivered: usize,
    pub failed: usize,
    pub suppressed: usize,
}

/// What an applied pass did.
#[derive(Debug, Clone)]
pub struct PassReport {
    /// Items in the unfiltered snapshot
    pub fetched: usize,
    /// Items that passed the name filter
    pub matched: usize,
    /// Committed upserts
    pub write_set: Vec<CatalogEntry>,
    /// Identifiers judged newly available, in snapshot order
    pub notify_set: Vec<String>,
    pub became_available: usize,
    pub became_unavailable: usize,
    pub unchanged: usize,
    pub dispatch: DispatchSummary,
}

/// Result of a pass that did not fail.
#[derive(Debug, Clone)]
pub enum ReconcileOutcome {
    /// The search returned nothing; state left as is
    NoResults,
    /// Nothing in the snapshot matched the name filter; state left as is
    NoMatches { fetched: usize },
    /// State committed and notifications dispatched
    Applied(PassReport),
}

impl ReconcileOutcome {
    pub fn report(&self) -> Option<&PassReport> {
        match self {
            Self::Applied(report) => Some(report),
            _ => None,
        }
    }
}

/// The reconciliation engine.
pub struct Reconciler {
    fetcher: Arc<dyn SnapshotFetcher>,
    store: Arc<dyn StateStore>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl Reconciler {
    /// Create an engine without a notifier; notify passes are then suppressed.
    pub fn new(fetcher: Arc<dyn SnapshotFetcher>, store: Arc<dyn StateStore>) -> Self {
        Self {
            fetcher,
            store,
            notifier: None,
        }
    }

    /// Attach the notifier used by [`PassMode::Notify`] passes.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Run one pass described by a request.
    pub async fn run(&self, request: &PassRequest) -> Result<ReconcileOutcome> {
        self.reconcile(&request.query, request.filter.as_ref(), request.mode)
            .await
    }

    /// Run one pass.
    ///
    /// Fetch and persistence failures abort the pass with nothing written and
    /// nothing announced. Notification failures are counted, never returned.
    pub async fn reconcile(
        &self,
        query: &SearchQuery,
        filter: Option<&NameFilter>,
        mode: PassMode,
    ) -> Result<ReconcileOutcome> {
        let prior = self.store.read_all().await?;
        log::debug!(
            "Loaded {} catalog entries from {}",
            prior.len(),
            self.store.location()
        );

        let snapshot = self.fetcher.fetch(query).await?;
        if snapshot.is_empty() {
            log::info!("No products found for query \"{}\"", query);
            return Ok(ReconcileOutcome::NoResults);
        }
        log::info!(
            "Found {} products for query \"{}\"",
            snapshot.len(),
            query
        );

        let relevant: Vec<&SnapshotItem> = match filter {
            Some(filter) => {
                let matched: Vec<&SnapshotItem> = snapshot
                    .iter()
                    .filter(|item| filter.matches(&item.name))
                    .collect();
                if !matched.is_empty() {
                    log::info!(
                        "Filtered down to {} products matching \"{}\"",
                        matched.len(),
                        filter
                    );
                }
                matched
            }
            None => snapshot.iter().collect(),
        };

        if relevant.is_empty() {
            log::info!("No products found after applying the filter");
            return Ok(ReconcileOutcome::NoMatches {
                fetched: snapshot.len(),
            });
        }

        let plan = plan_pass(&prior, &snapshot, &relevant);
        let write_set = plan.write_set();

        self.store.upsert_batch(&write_set).await?;
        log::info!(
            "Committed {} upserts ({} available, {} unavailable)",
            write_set.len(),
            plan.count(Transition::BecameAvailable),
            plan.count(Transition::BecameUnavailable)
        );

        let dispatch = self.dispatch(&plan.notify_set, mode).await;

        Ok(ReconcileOutcome::Applied(PassReport {
            fetched: snapshot.len(),
            matched: relevant.len(),
            notify_set: plan.notify_ids(),
            became_available: plan.count(Transition::BecameAvailable),
            became_unavailable: plan.count(Transition::BecameUnavailable),
            unchanged: plan.count(Transition::Unchanged),
            write_set,
            dispatch,
        }))
    }

    /// Announce each item in order; one failure never stops the rest.
    async fn dispatch(&self, items: &[SnapshotItem], mode: PassMode) -> DispatchSummary {
        let mut summary = DispatchSummary::default();

        let notifier = match (mode, &self.notifier) {
            (PassMode::Notify, Some(notifier)) => notifier,
            (PassMode::Notify, None) => {
                if !items.is_empty() {
                    log::warn!(
                        "No notifier configured; {} announcements suppressed",
                        items.len()
                    );
                }
                summary.suppressed = items.len();
                return summary;
            }
            (PassMode::Seed, _) => {
                summary.suppressed = items.len();
                return summary;
            }
        };

        for item in items {
            log::info!("New product found or back in stock: {}", item.name);
            match notifier.notify(item).await {
                Ok(()) => summary.delivered += 1,
                Err(e) => {
                    summary.failed += 1;
                    log::error!("Failed to announce {} ({}): {}", item.name, item.id, e);
                }
            }
        }

        summary
    }
}
