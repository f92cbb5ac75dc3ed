use crate::runner::JobRunner;
use anyhow::Result;
use oi_alert_core::{HealthState, RunReport, ScheduleConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{info, warn};

/// Fires the job runner on a fixed interval, never two runs at once.
pub struct AlertScheduler {
    runner: Arc<JobRunner>,
    health: Arc<HealthState>,
    config: ScheduleConfig,
    run_guard: Arc<Mutex<()>>,
}

impl AlertScheduler {
    /// Creates a new alert scheduler.
    #[must_use]
    pub fn new(runner: Arc<JobRunner>, health: Arc<HealthState>, config: ScheduleConfig) -> Self {
        Self {
            runner,
            health,
            config,
            run_guard: Arc::new(Mutex::new(())),
        }
    }

    /// Starts the scheduler and runs until `shutdown` turns true or its sender is dropped.
    ///
    /// On shutdown no further runs start; an in-flight run gets
    /// `shutdown_grace_secs` to finish and is abandoned after that.
    ///
    /// # Errors
    /// Returns an error if the job scheduler fails to start or stop.
    pub async fn run_until(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let interval = Duration::from_secs(self.config.interval_secs);
        info!(
            "Starting alert scheduler: every {}s, first run {}",
            interval.as_secs(),
            if self.config.run_on_start { "now" } else { "after one interval" }
        );

        let mut scheduler = JobScheduler::new().await?;
        let runner = self.runner.clone();
        let health = self.health.clone();
        let guard = self.run_guard.clone();

        let job = Job::new_repeated_async(interval, move |_uuid, _lock| {
            let runner = runner.clone();
            let health = health.clone();
            let guard = guard.clone();
            Box::pin(async move {
                tick(runner, health, guard).await;
            })
        })?;

        scheduler.add(job).await?;
        scheduler.start().await?;
        self.health.set_scheduler_running(true);

        if self.config.run_on_start {
            tokio::spawn(tick(
                self.runner.clone(),
                self.health.clone(),
                self.run_guard.clone(),
            ));
        }

        while !*shutdown.borrow_and_update() {
            if shutdown.changed().await.is_err() {
                break;
            }
        }

        info!("Shutdown requested, stopping alert scheduler");
        self.health.set_scheduler_running(false);
        scheduler.shutdown().await?;

        let grace = Duration::from_secs(self.config.shutdown_grace_secs);
        match tokio::time::timeout(grace, self.run_guard.lock()).await {
            Ok(_idle) => info!("Alert scheduler stopped"),
            Err(_) => warn!(
                "Run still in progress after {}s grace period, abandoning it",
                grace.as_secs()
            ),
        }
        Ok(())
    }
}

/// Executes one run unless another is still in flight. Returns `None` for a skipped tick.
pub(crate) async fn tick(
    runner: Arc<JobRunner>,
    health: Arc<HealthState>,
    guard: Arc<Mutex<()>>,
) -> Option<RunReport> {
    let Ok(_running) = guard.try_lock_owned() else {
        warn!("Previous run still in progress, skipping this tick");
        health.run_skipped();
        return None;
    };

    health.run_started();
    let report = runner.run_isolated().await;
    health.run_finished(&report);
    info!("Run finished [{}]: {}", report.outcome.label(), report.summary());
    Some(report)
}
