use crate::types::{MarketCaps, OpenInterestBatch};
use anyhow::Result;
use async_trait::async_trait;

/// Spot market-data provider.
///
/// Implementations never fail: a provider error is logged and reported as an
/// empty mapping, which the runner treats as "source unavailable".
#[async_trait]
pub trait MarketCapSource: Send + Sync {
    /// Assets with `0 < market cap < max_cap_usd`, keyed by canonical symbol.
    async fn fetch_market_caps(&self, max_cap_usd: f64) -> MarketCaps;
    fn name(&self) -> &str;
}

/// Derivatives exchange reporting open interest per contract.
///
/// Same contract as [`MarketCapSource`]: errors degrade to an empty batch.
#[async_trait]
pub trait OpenInterestSource: Send + Sync {
    async fn fetch_open_interest(&self) -> OpenInterestBatch;
    fn name(&self) -> &str;
}

/// Delivery channel for formatted alert messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, message: &str) -> Result<()>;
    fn name(&self) -> &str;
}
