//! Monitoring pipeline.
//!
//! - `diff`: Plan availability transitions for one snapshot
//! - `reconcile`: Run one fetch, commit and announce pass
//! - `schedule`: Repeat passes on an interval, one at a time

pub mod diff;
pub mod reconcile;
pub mod schedule;

#[cfg(test)]
pub(crate) mod fakes;

pub use diff::{PassPlan, Transition, plan_pass};
pub use reconcile::{
    DispatchSummary, PassMode, PassReport, PassRequest, ReconcileOutcome, Reconciler,
};
pub use schedule::{Scheduler, SchedulerStats, log_result};
