// src/pipeline/schedule.rs

//! Fixed-interval pass scheduling with a single-flight guard.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;

use crate::error::Result;
use crate::pipeline::reconcile::{PassRequest, ReconcileOutcome, Reconciler};

/// Tally of what the loop did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub applied: usize,
    pub noops: usize,
    pub failures: usize,
    pub skipped: usize,
}

impl SchedulerStats {
    pub fn passes(&self) -> usize {
        self.applied + self.noops + self.failures
    }

    fn record(&mut self, result: Option<&Result<ReconcileOutcome>>) {
        match result {
            None => self.skipped += 1,
            Some(Ok(ReconcileOutcome::Applied(_))) => self.applied += 1,
            Some(Ok(_)) => self.noops += 1,
            Some(Err(_)) => self.failures += 1,
        }
    }
}

/// Runs one pass per tick, never two at once.
pub struct Scheduler {
    reconciler: Arc<Reconciler>,
    request: PassRequest,
    interval: Duration,
    pass_lock: Mutex<()>,
}

impl Scheduler {
    pub fn new(reconciler: Arc<Reconciler>, request: PassRequest, interval: Duration) -> Self {
        Self {
            reconciler,
            request,
            interval,
            pass_lock: Mutex::new(()),
        }
    }

    /// Run one pass unless another is in flight, in which case `None`.
    pub async fn tick(&self) -> Option<Result<ReconcileOutcome>> {
        let Ok(_guard) = self.pass_lock.try_lock() else {
            log::warn!("Previous pass still running, skipping this tick");
            return None;
        };

        let result = self.reconciler.run(&self.request).await;
        log_result(&result);
        Some(result)
    }

    /// Run passes on the interval until `shutdown` resolves.
    ///
    /// The first pass starts immediately. A pass in progress when shutdown
    /// fires is allowed to finish. Pass failures are logged and the loop
    /// waits for the next tick.
    pub async fn run_until<F>(&self, shutdown: F) -> SchedulerStats
    where
        F: Future<Output = ()>,
    {
        let mut timer = tokio::time::interval(self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        let mut stats = SchedulerStats::default();
        log::info!(
            "Monitoring \"{}\" every {}s",
            self.request.query,
            self.interval.as_secs()
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    log::info!("Shutdown requested, stopping scheduler");
                    break;
                }
                _ = timer.tick() => {
                    let result = self.tick().await;
                    stats.record(result.as_ref());
                }
            }
        }

        stats
    }
}

/// Log how a pass ended.
pub fn log_result(result: &Result<ReconcileOutcome>) {
    match result {
        Ok(ReconcileOutcome::Applied(report)) => log::info!(
            "Pass complete: {} fetched, {} matched, {} written, {} announced, {} failed, {} suppressed",
            report.fetched,
            report.matched,
            report.write_set.len(),
            report.dispatch.delivered,
            report.dispatch.failed,
            report.dispatch.suppressed
        ),
        Ok(ReconcileOutcome::NoResults) => log::info!("Pass complete: nothing listed"),
        Ok(ReconcileOutcome::NoMatches { fetched }) => {
            log::info!("Pass complete: none of {} listed items matched", fetched)
        }
        Err(e) => log::error!("Error monitoring products ({:?}): {}", e.kind(), e),
    }
}
