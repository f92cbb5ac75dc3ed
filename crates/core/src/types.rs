//! Per-run data model.
//!
//! Everything here is created fresh by a run and dropped when the run ends.
//! Nothing is persisted between runs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Spot market snapshot for one asset, keyed by its canonical symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetSnapshot {
    /// Uppercase, exchange-agnostic ticker.
    pub symbol: String,
    /// Human-readable name from the market-data provider.
    pub name: String,
    /// Market capitalization in USD. Always strictly positive.
    pub market_cap_usd: f64,
}

impl AssetSnapshot {
    /// Creates a new snapshot.
    pub fn new(symbol: impl Into<String>, name: impl Into<String>, market_cap_usd: f64) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            market_cap_usd,
        }
    }
}

/// Canonical symbol to market snapshot.
pub type MarketCaps = HashMap<String, AssetSnapshot>;

/// Canonical symbol to USD open interest.
pub type OpenInterestMap = HashMap<String, f64>;

/// Open interest reported for one tradeable contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenInterestEntry {
    pub symbol: String,
    pub open_interest_usd: f64,
}

/// Result of one open-interest sweep over the exchange's contracts.
#[derive(Debug, Clone, Default)]
pub struct OpenInterestBatch {
    /// Canonical symbol to USD open interest, one per contract that returned valid data.
    pub entries: OpenInterestMap,
    /// Contract identifiers whose per-symbol fetch failed.
    pub skipped: Vec<String>,
    /// Number of tradeable contracts found during discovery.
    pub discovered: usize,
}

impl OpenInterestBatch {
    /// Builds a batch from already-collected entries.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = OpenInterestEntry>) -> Self {
        let entries: OpenInterestMap = entries
            .into_iter()
            .map(|e| (e.symbol, e.open_interest_usd))
            .collect();
        let discovered = entries.len();
        Self {
            entries,
            skipped: Vec::new(),
            discovered,
        }
    }

    /// Records a successful fetch. A later entry for the same symbol replaces the earlier one.
    pub fn record(&mut self, entry: OpenInterestEntry) {
        self.entries.insert(entry.symbol, entry.open_interest_usd);
    }

    /// Records a contract whose fetch failed.
    pub fn skip(&mut self, contract: impl Into<String>) {
        self.skipped.push(contract.into());
    }

    /// Returns true when no open interest was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of symbols with open interest.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// An asset whose open interest exceeds the configured share of its market cap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatioAlert {
    pub symbol: String,
    /// `open_interest_usd / market_cap_usd`
    pub ratio: f64,
    pub market_cap_usd: f64,
    pub open_interest_usd: f64,
}

impl RatioAlert {
    /// Creates an alert, computing the ratio from its inputs.
    ///
    /// `market_cap_usd` must be strictly positive.
    pub fn new(symbol: impl Into<String>, market_cap_usd: f64, open_interest_usd: f64) -> Self {
        Self {
            symbol: symbol.into(),
            ratio: open_interest_usd / market_cap_usd,
            market_cap_usd,
            open_interest_usd,
        }
    }
}

/// The two upstream data sources of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    MarketData,
    OpenInterest,
}

impl DataSource {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MarketData => "market data",
            Self::OpenInterest => "open interest",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the composed alert reached the notification channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum DeliveryStatus {
    Delivered,
    Failed(String),
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunOutcome {
    /// A data source returned nothing; no evaluation took place.
    SourceUnavailable { source: DataSource },
    /// Both sources answered but no symbol crossed the threshold.
    NoAlerts {
        /// Symbols present in both sources.
        matched: usize,
    },
    /// At least one symbol crossed the threshold.
    Alerted {
        alerts: Vec<RatioAlert>,
        delivery: DeliveryStatus,
    },
    /// The run hit an unexpected error and was abandoned.
    Failed { reason: String },
}

impl RunOutcome {
    /// Short label used by the health endpoint and logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::SourceUnavailable { .. } => "source_unavailable",
            Self::NoAlerts { .. } => "no_alerts",
            Self::Alerted { .. } => "alerted",
            Self::Failed { .. } => "failed",
        }
    }

    /// Alerts produced by the run, empty unless it alerted.
    #[must_use]
    pub fn alerts(&self) -> &[RatioAlert] {
        match self {
            Self::Alerted { alerts, .. } => alerts,
            _ => &[],
        }
    }
}

/// Everything a single run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: RunOutcome,
    /// Contracts whose open-interest fetch failed during this run.
    pub skipped_symbols: Vec<String>,
}

impl RunReport {
    /// Wall-clock duration of the run.
    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// One-line human summary.
    #[must_use]
    pub fn summary(&self) -> String {
        let detail = match &self.outcome {
            RunOutcome::SourceUnavailable { source } => format!("{source} source unavailable"),
            RunOutcome::NoAlerts { matched } => {
                format!("{matched} symbols matched, none above threshold")
            }
            RunOutcome::Alerted { alerts, delivery } => match delivery {
                DeliveryStatus::Delivered => format!("{} alert(s) delivered", alerts.len()),
                DeliveryStatus::Failed(e) => {
                    format!("{} alert(s), delivery failed: {e}", alerts.len())
                }
            },
            RunOutcome::Failed { reason } => format!("run failed: {reason}"),
        };
        format!(
            "{detail} ({} skipped, {} ms)",
            self.skipped_symbols.len(),
            self.duration().num_milliseconds()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_alert_computes_ratio() {
        let alert = RatioAlert::new("BTC", 50e6, 20e6);
        assert!((alert.ratio - 0.4).abs() < 1e-12);
        assert_eq!(alert.symbol, "BTC");
    }

    #[test]
    fn test_batch_record_and_skip() {
        let mut batch = OpenInterestBatch::default();
        assert!(batch.is_empty());

        batch.record(OpenInterestEntry {
            symbol: "ABC".to_string(),
            open_interest_usd: 1.0,
        });
        batch.record(OpenInterestEntry {
            symbol: "ABC".to_string(),
            open_interest_usd: 2.0,
        });
        batch.skip("XYZUSDT");

        assert_eq!(batch.len(), 1);
        assert_eq!(batch.entries["ABC"], 2.0);
        assert_eq!(batch.skipped, vec!["XYZUSDT".to_string()]);
    }

    #[test]
    fn test_outcome_labels() {
        let unavailable = RunOutcome::SourceUnavailable {
            source: DataSource::MarketData,
        };
        assert_eq!(unavailable.label(), "source_unavailable");
        assert!(unavailable.alerts().is_empty());

        let none = RunOutcome::NoAlerts { matched: 0 };
        assert_eq!(none.label(), "no_alerts");
        assert_ne!(none, unavailable);
    }

    #[test]
    fn test_report_summary_mentions_source() {
        let now = Utc::now();
        let report = RunReport {
            started_at: now,
            finished_at: now,
            outcome: RunOutcome::SourceUnavailable {
                source: DataSource::OpenInterest,
            },
            skipped_symbols: vec![],
        };
        assert!(report.summary().contains("open interest source unavailable"));
    }

    #[test]
    fn test_outcome_serializes_with_kind_tag() {
        let outcome = RunOutcome::Alerted {
            alerts: vec![RatioAlert::new("BTC", 50e6, 20e6)],
            delivery: DeliveryStatus::Delivered,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["kind"], "alerted");
        assert_eq!(json["delivery"]["status"], "delivered");
    }
}
