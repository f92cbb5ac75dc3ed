//! Market-cap snapshot built from the CoinGecko markets listing.

use crate::client::CoinGeckoClient;
use crate::models::MarketItem;
use anyhow::Result;
use async_trait::async_trait;
use oi_alert_core::{canonical_symbol, AssetSnapshot, CoinGeckoConfig, MarketCapSource, MarketCaps};

/// [`MarketCapSource`] backed by CoinGecko.
pub struct CoinGeckoMarketSource {
    client: CoinGeckoClient,
    pages: u32,
}

impl CoinGeckoMarketSource {
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn from_config(config: &CoinGeckoConfig) -> Result<Self> {
        Ok(Self::new(CoinGeckoClient::new(config)?, config.pages))
    }

    #[must_use]
    pub fn new(client: CoinGeckoClient, pages: u32) -> Self {
        Self {
            client,
            pages: pages.max(1),
        }
    }

    async fn collect(&self, max_cap_usd: f64) -> Result<MarketCaps> {
        let mut caps = MarketCaps::new();
        for page in 1..=self.pages {
            let items = self.client.get_markets_page(page).await?;
            let exhausted = items.is_empty();
            retain_small_caps(&mut caps, items, max_cap_usd);
            if exhausted {
                break;
            }
        }
        Ok(caps)
    }
}

/// Inserts every item with a symbol and `0 < market_cap < max_cap_usd`.
///
/// Provider order matters: a later item with the same canonical symbol replaces the earlier one.
pub fn retain_small_caps(caps: &mut MarketCaps, items: Vec<MarketItem>, max_cap_usd: f64) {
    for item in items {
        let Some(market_cap) = item.market_cap else {
            continue;
        };
        let symbol = match item.symbol.as_deref().map(canonical_symbol) {
            Some(s) if !s.is_empty() => s,
            _ => continue,
        };
        if market_cap > 0.0 && market_cap < max_cap_usd {
            let snapshot = AssetSnapshot::new(symbol.clone(), item.display_name(), market_cap);
            caps.insert(symbol, snapshot);
        }
    }
}

#[async_trait]
impl MarketCapSource for CoinGeckoMarketSource {
    async fn fetch_market_caps(&self, max_cap_usd: f64) -> MarketCaps {
        match self.collect(max_cap_usd).await {
            Ok(caps) => {
                tracing::info!(
                    "Market caps: {} assets under ${:.0}M",
                    caps.len(),
                    max_cap_usd / 1e6
                );
                caps
            }
            Err(e) => {
                tracing::warn!("CoinGecko market data unavailable: {:#}", e);
                MarketCaps::new()
            }
        }
    }

    fn name(&self) -> &str {
        "coingecko"
    }
}
