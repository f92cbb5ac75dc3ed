//! CoinGecko public API client.

use crate::models::MarketItem;
use anyhow::{anyhow, Context, Result};
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use oi_alert_core::CoinGeckoConfig;
use reqwest::Client;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// CoinGecko API base URL.
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko REST client.
pub struct CoinGeckoClient {
    /// HTTP client
    http: Client,
    /// Base URL for API
    base_url: String,
    vs_currency: String,
    per_page: u32,
    timeout: Duration,
    /// Rate limiter (requests per minute); the public tier allows about 30
    rate_limiter: Arc<
        RateLimiter<
            governor::state::NotKeyed,
            governor::state::InMemoryState,
            governor::clock::DefaultClock,
        >,
    >,
}

impl CoinGeckoClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: &CoinGeckoConfig) -> Result<Self> {
        Self::with_rate_limit(config, nonzero!(30u32))
    }

    /// Creates a client with a custom rate limit.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn with_rate_limit(
        config: &CoinGeckoConfig,
        requests_per_minute: NonZeroU32,
    ) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("oi-alert/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            vs_currency: config.vs_currency.clone(),
            per_page: config.per_page,
            timeout: Duration::from_secs(config.timeout_secs),
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_minute(requests_per_minute))),
        })
    }

    /// Sets a custom base URL (useful for testing).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches one page of `/coins/markets`, ordered by descending market cap.
    ///
    /// Items that cannot be decoded are dropped; the page itself must be a JSON array.
    ///
    /// # Errors
    /// Transport failure, non-success status, or a body that is not an array.
    pub async fn get_markets_page(&self, page: u32) -> Result<Vec<MarketItem>> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}/coins/markets", self.base_url);
        let per_page = self.per_page.to_string();
        let page = page.to_string();
        tracing::debug!("GET {} page {}", url, page);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("vs_currency", self.vs_currency.as_str()),
                ("order", "market_cap_desc"),
                ("per_page", per_page.as_str()),
                ("page", page.as_str()),
                ("sparkline", "false"),
            ])
            .timeout(self.timeout)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("CoinGecko API error {}: {}", status, text));
        }

        let body: serde_json::Value = response.json().await?;
        let serde_json::Value::Array(items) = body else {
            return Err(anyhow!("CoinGecko markets response is not a list"));
        };

        let total = items.len();
        let decoded: Vec<MarketItem> = items.into_iter().filter_map(MarketItem::from_value).collect();
        if decoded.len() < total {
            tracing::debug!("Dropped {} malformed market items", total - decoded.len());
        }
        Ok(decoded)
    }
}
