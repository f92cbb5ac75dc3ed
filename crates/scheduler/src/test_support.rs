//! In-memory sources and notifiers for runner and scheduler tests.

use anyhow::{bail, Result};
use async_trait::async_trait;
use oi_alert_core::{
    AssetSnapshot, MarketCapSource, MarketCaps, Notifier, OpenInterestBatch, OpenInterestEntry,
    OpenInterestSource,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn caps(entries: &[(&str, f64)]) -> MarketCaps {
    entries
        .iter()
        .map(|(s, mc)| (s.to_string(), AssetSnapshot::new(*s, *s, *mc)))
        .collect()
}

pub fn batch(entries: &[(&str, f64)]) -> OpenInterestBatch {
    OpenInterestBatch::from_entries(entries.iter().map(|(s, oi)| OpenInterestEntry {
        symbol: s.to_string(),
        open_interest_usd: *oi,
    }))
}

pub struct StaticMarket {
    pub caps: MarketCaps,
    pub delay: Duration,
    pub calls: AtomicUsize,
}

impl StaticMarket {
    pub fn new(caps: MarketCaps) -> Self {
        Self {
            caps,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn slow(caps: MarketCaps, delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new(caps)
        }
    }
}

#[async_trait]
impl MarketCapSource for StaticMarket {
    async fn fetch_market_caps(&self, max_cap_usd: f64) -> MarketCaps {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.caps
            .iter()
            .filter(|(_, s)| s.market_cap_usd < max_cap_usd)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn name(&self) -> &str {
        "static-market"
    }
}

pub struct StaticOpenInterest(pub OpenInterestBatch);

#[async_trait]
impl OpenInterestSource for StaticOpenInterest {
    async fn fetch_open_interest(&self) -> OpenInterestBatch {
        self.0.clone()
    }

    fn name(&self) -> &str {
        "static-oi"
    }
}

pub struct PanickingOpenInterest;

#[async_trait]
impl OpenInterestSource for PanickingOpenInterest {
    async fn fetch_open_interest(&self) -> OpenInterestBatch {
        panic!("exchange adapter bug");
    }

    fn name(&self) -> &str {
        "panicking-oi"
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: Mutex<Vec<String>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, message: &str) -> Result<()> {
        self.messages.lock().push(message.to_string());
        if self.fail {
            bail!("chat not found");
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}
