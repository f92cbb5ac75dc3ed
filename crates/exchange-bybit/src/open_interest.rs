//! Open-interest sweep over every tradeable USDT linear contract.
//!
//! Discovery lists the instruments once per run; the per-symbol requests then
//! run through a bounded stream that shares the client's rate limiter. A
//! failure on one symbol only drops that symbol.

use crate::client::{BybitClient, BybitClientConfig};
use crate::error::Result;
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use oi_alert_core::{
    normalize_contract_symbol, BybitConfig, OpenInterestBatch, OpenInterestEntry,
    OpenInterestSource,
};
use std::sync::Arc;
use std::time::Duration;

/// [`OpenInterestSource`] backed by the Bybit v5 public API.
#[derive(Debug)]
pub struct BybitOpenInterestSource {
    client: Arc<BybitClient>,
    category: String,
    quote_suffix: String,
    trading_status: String,
    max_concurrency: usize,
    error_backoff: Duration,
}

impl BybitOpenInterestSource {
    /// Builds the source and its client from configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn from_config(config: &BybitConfig) -> Result<Self> {
        let client = BybitClient::new(BybitClientConfig::from(config))?;
        Ok(Self::new(Arc::new(client), config))
    }

    /// Wraps an existing client.
    #[must_use]
    pub fn new(client: Arc<BybitClient>, config: &BybitConfig) -> Self {
        Self {
            client,
            category: config.category.clone(),
            quote_suffix: config.quote_suffix.clone(),
            trading_status: config.trading_status.clone(),
            max_concurrency: config.max_concurrency.max(1),
            error_backoff: Duration::from_millis(config.error_backoff_ms),
        }
    }

    /// Contract identifiers that are quoted in the configured suffix and trading.
    ///
    /// # Errors
    /// Any failure of the instruments listing.
    pub async fn discover_contracts(&self) -> Result<Vec<String>> {
        let instruments = self.client.get_instruments(&self.category).await?;
        let total = instruments.len();

        let contracts: Vec<String> = instruments
            .into_iter()
            .filter(|i| i.is_tradeable(&self.quote_suffix, &self.trading_status))
            .map(|i| i.symbol)
            .collect();

        tracing::debug!(
            "Bybit {} instruments: {} listed, {} tradeable {} contracts",
            self.category,
            total,
            contracts.len(),
            self.quote_suffix
        );
        Ok(contracts)
    }

    async fn fetch_one(&self, contract: &str) -> Result<Option<f64>> {
        let result = self
            .client
            .get_open_interest(&self.category, contract)
            .await;

        if let Err(e) = &result {
            if e.warrants_backoff() {
                tokio::time::sleep(self.error_backoff).await;
            }
        }
        result
    }
}

#[async_trait]
impl OpenInterestSource for BybitOpenInterestSource {
    async fn fetch_open_interest(&self) -> OpenInterestBatch {
        let contracts = match self.discover_contracts().await {
            Ok(contracts) => contracts,
            Err(e) => {
                tracing::warn!("Bybit contract discovery failed: {}", e);
                return OpenInterestBatch::default();
            }
        };

        let mut batch = OpenInterestBatch {
            discovered: contracts.len(),
            ..OpenInterestBatch::default()
        };

        let results: Vec<(String, Result<Option<f64>>)> = stream::iter(contracts)
            .map(|contract| async move {
                let result = self.fetch_one(&contract).await;
                (contract, result)
            })
            .buffered(self.max_concurrency)
            .collect()
            .await;

        for (contract, result) in results {
            match result {
                Ok(Some(open_interest_usd)) => batch.record(OpenInterestEntry {
                    symbol: normalize_contract_symbol(&contract, &self.quote_suffix),
                    open_interest_usd,
                }),
                Ok(None) => {
                    tracing::debug!("No open interest reported for {}", contract);
                    batch.skip(contract);
                }
                Err(e) => {
                    tracing::debug!("Open interest fetch failed for {}: {}", contract, e);
                    batch.skip(contract);
                }
            }
        }

        tracing::info!(
            "Open interest collected for {}/{} contracts ({} skipped)",
            batch.len(),
            batch.discovered,
            batch.skipped.len()
        );
        batch
    }

    fn name(&self) -> &str {
        "bybit"
    }
}
