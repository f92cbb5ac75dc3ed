//! Liveness state shared between the scheduler and the HTTP health endpoint.
//!
//! This is the only state the two sides share. The scheduler writes it, the
//! health endpoint only reads it.

use crate::types::RunReport;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Debug, Clone, Serialize)]
pub struct LastRun {
    pub finished_at: DateTime<Utc>,
    pub outcome: &'static str,
    pub alerts: usize,
    pub skipped_symbols: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub scheduler_running: bool,
    pub run_in_progress: bool,
    pub runs_completed: u64,
    pub runs_skipped: u64,
    pub last_run: Option<LastRun>,
}

#[derive(Debug, Default)]
pub struct HealthState {
    scheduler_running: AtomicBool,
    run_in_progress: AtomicBool,
    runs_completed: AtomicU64,
    runs_skipped: AtomicU64,
    last_run: RwLock<Option<LastRun>>,
}

impl HealthState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_scheduler_running(&self, running: bool) {
        self.scheduler_running.store(running, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_scheduler_running(&self) -> bool {
        self.scheduler_running.load(Ordering::SeqCst)
    }

    pub fn run_started(&self) {
        self.run_in_progress.store(true, Ordering::SeqCst);
    }

    /// Records a finished run.
    pub fn run_finished(&self, report: &RunReport) {
        *self.last_run.write() = Some(LastRun {
            finished_at: report.finished_at,
            outcome: report.outcome.label(),
            alerts: report.outcome.alerts().len(),
            skipped_symbols: report.skipped_symbols.len(),
        });
        self.runs_completed.fetch_add(1, Ordering::SeqCst);
        self.run_in_progress.store(false, Ordering::SeqCst);
    }

    /// Records a tick that was dropped because a run was still in flight.
    pub fn run_skipped(&self) {
        self.runs_skipped.fetch_add(1, Ordering::SeqCst);
    }

    #[must_use]
    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            scheduler_running: self.scheduler_running.load(Ordering::SeqCst),
            run_in_progress: self.run_in_progress.load(Ordering::SeqCst),
            runs_completed: self.runs_completed.load(Ordering::SeqCst),
            runs_skipped: self.runs_skipped.load(Ordering::SeqCst),
            last_run: self.last_run.read().clone(),
        }
    }
}
