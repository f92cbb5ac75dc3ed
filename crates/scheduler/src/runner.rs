//! One end-to-end check: fetch, join, evaluate, format, deliver.

use chrono::Utc;
use oi_alert_core::{
    evaluate, matched_symbols, AlertConfig, AlertFormatter, DataSource, DeliveryStatus,
    MarketCapSource, Notifier, OpenInterestSource, RunOutcome, RunReport,
};
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct JobRunner {
    market: Arc<dyn MarketCapSource>,
    open_interest: Arc<dyn OpenInterestSource>,
    notifier: Arc<dyn Notifier>,
    config: AlertConfig,
}

impl JobRunner {
    #[must_use]
    pub fn new(
        market: Arc<dyn MarketCapSource>,
        open_interest: Arc<dyn OpenInterestSource>,
        notifier: Arc<dyn Notifier>,
        config: AlertConfig,
    ) -> Self {
        Self {
            market,
            open_interest,
            notifier,
            config,
        }
    }

    /// Performs a single run.
    ///
    /// Source failures and delivery failures are part of the returned outcome;
    /// this never returns an error.
    pub async fn run(&self) -> RunReport {
        let started_at = Utc::now();
        info!(
            "Checking OI/MC ratios (market cap < ${:.0}M, threshold {:.1}%)",
            self.config.market_cap_limit_usd / 1e6,
            self.config.ratio_threshold * 100.0
        );

        let (caps, batch) = tokio::join!(
            self.market.fetch_market_caps(self.config.market_cap_limit_usd),
            self.open_interest.fetch_open_interest()
        );

        let outcome = if caps.is_empty() {
            RunOutcome::SourceUnavailable {
                source: DataSource::MarketData,
            }
        } else if batch.is_empty() {
            RunOutcome::SourceUnavailable {
                source: DataSource::OpenInterest,
            }
        } else {
            let alerts = evaluate(&caps, &batch.entries, self.config.ratio_threshold);
            match AlertFormatter::format(&alerts, self.config.ratio_threshold) {
                None => RunOutcome::NoAlerts {
                    matched: matched_symbols(&caps, &batch.entries),
                },
                Some(message) => {
                    let delivery = self.deliver(&message).await;
                    RunOutcome::Alerted { alerts, delivery }
                }
            }
        };

        if let RunOutcome::SourceUnavailable { source } = &outcome {
            warn!("{} source unavailable ({}), skipping this run", source, self.source_name(*source));
        }

        RunReport {
            started_at,
            finished_at: Utc::now(),
            outcome,
            skipped_symbols: batch.skipped,
        }
    }

    /// Runs on a separate task so that a panic anywhere in the pipeline ends
    /// this run only.
    pub async fn run_isolated(self: &Arc<Self>) -> RunReport {
        let started_at = Utc::now();
        let runner = Arc::clone(self);

        match tokio::spawn(async move { runner.run().await }).await {
            Ok(report) => report,
            Err(e) => {
                let reason = if e.is_panic() {
                    let payload = e.into_panic();
                    let message = payload
                        .downcast_ref::<&str>()
                        .map(|s| (*s).to_string())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    format!("run panicked: {message}")
                } else {
                    "run was cancelled".to_string()
                };
                error!("{}", reason);
                RunReport {
                    started_at,
                    finished_at: Utc::now(),
                    outcome: RunOutcome::Failed { reason },
                    skipped_symbols: Vec::new(),
                }
            }
        }
    }

    async fn deliver(&self, message: &str) -> DeliveryStatus {
        match self.notifier.deliver(message).await {
            Ok(()) => DeliveryStatus::Delivered,
            Err(e) => {
                error!("Alert delivery via {} failed: {:#}", self.notifier.name(), e);
                DeliveryStatus::Failed(format!("{e:#}"))
            }
        }
    }

    fn source_name(&self, source: DataSource) -> &str {
        match source {
            DataSource::MarketData => self.market.name(),
            DataSource::OpenInterest => self.open_interest.name(),
        }
    }
}
