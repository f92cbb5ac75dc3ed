//! Bybit v5 public market-data client with rate limiting.
//!
//! Only the two unauthenticated endpoints the alert pipeline needs are wrapped:
//! the linear instruments listing and per-symbol open interest. Every request
//! goes through one shared `governor` limiter, so callers may issue requests
//! from several tasks without exceeding the configured pace.
//!
//! # Example
//!
//! ```ignore
//! use oi_alert_bybit::{BybitClient, BybitClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> oi_alert_bybit::Result<()> {
//!     let client = BybitClient::new(BybitClientConfig::default())?;
//!     let instruments = client.get_instruments("linear").await?;
//!     let oi = client.get_open_interest("linear", "BTCUSDT").await?;
//!     println!("{} instruments, BTC OI {:?}", instruments.len(), oi);
//!     Ok(())
//! }
//! ```

use crate::error::{BybitError, Result};
use crate::types::{Envelope, Instrument, InstrumentsResult, OpenInterestResult};
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use oi_alert_core::BybitConfig;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// Constants
// =============================================================================

/// Bybit production API base URL.
pub const BYBIT_API_URL: &str = "https://api.bybit.com";

const INSTRUMENTS_PATH: &str = "/v5/market/instruments-info";
const OPEN_INTEREST_PATH: &str = "/v5/market/open-interest";

/// Upper bound on instrument pages followed in one discovery.
const MAX_INSTRUMENT_PAGES: usize = 20;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the Bybit client.
#[derive(Debug, Clone)]
pub struct BybitClientConfig {
    /// Base URL for the API.
    pub base_url: String,

    /// Minimum spacing between two requests.
    pub request_interval: Duration,

    /// Timeout for listing endpoints.
    pub list_timeout: Duration,

    /// Timeout for per-symbol endpoints.
    pub symbol_timeout: Duration,

    /// `intervalTime` sent with open-interest requests.
    pub open_interest_interval: String,

    /// Page size for the instruments listing.
    pub instruments_page_limit: u32,
}

impl Default for BybitClientConfig {
    fn default() -> Self {
        Self::from(&BybitConfig::default())
    }
}

impl From<&BybitConfig> for BybitClientConfig {
    fn from(config: &BybitConfig) -> Self {
        Self {
            base_url: config.api_url.clone(),
            request_interval: Duration::from_millis(config.request_interval_ms),
            list_timeout: Duration::from_secs(config.list_timeout_secs),
            symbol_timeout: Duration::from_secs(config.symbol_timeout_secs),
            open_interest_interval: config.open_interest_interval.clone(),
            instruments_page_limit: config.instruments_page_limit,
        }
    }
}

impl BybitClientConfig {
    /// Sets the base URL (useful for testing).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the minimum spacing between requests.
    #[must_use]
    pub fn with_request_interval(mut self, interval: Duration) -> Self {
        self.request_interval = interval;
        self
    }

    /// Sets both request timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, list: Duration, symbol: Duration) -> Self {
        self.list_timeout = list;
        self.symbol_timeout = symbol;
        self
    }
}

// =============================================================================
// BybitClient
// =============================================================================

type DirectRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Bybit REST API client.
pub struct BybitClient {
    /// Configuration.
    config: BybitClientConfig,

    /// HTTP client.
    http: Client,

    /// One permit per `request_interval`, no burst.
    rate_limiter: Arc<DirectRateLimiter>,
}

impl std::fmt::Debug for BybitClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BybitClient")
            .field("base_url", &self.config.base_url)
            .field("request_interval", &self.config.request_interval)
            .finish_non_exhaustive()
    }
}

impl BybitClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: BybitClientConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("oi-alert/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                BybitError::Configuration(format!("failed to build HTTP client: {e}"))
            })?;

        let quota = Quota::with_period(config.request_interval)
            .unwrap_or_else(|| Quota::per_second(nonzero!(1000u32)))
            .allow_burst(nonzero!(1u32));
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Ok(Self {
            config,
            http,
            rate_limiter,
        })
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Waits for a rate-limit permit, performs a GET and unwraps the v5 envelope.
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<T> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.config.base_url, path);
        tracing::debug!("GET {} {:?}", url, query);

        let response = self
            .http
            .get(&url)
            .query(query)
            .timeout(timeout)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BybitError::api(status.as_u16(), text));
        }

        let envelope: Envelope = response.json().await?;
        if envelope.ret_code != 0 {
            return Err(BybitError::ret_code(envelope.ret_code, envelope.ret_msg));
        }

        Ok(serde_json::from_value(envelope.result)?)
    }

    /// Lists all instruments of `category`, following pagination cursors.
    ///
    /// # Errors
    /// Any failed page fails the whole listing.
    pub async fn get_instruments(&self, category: &str) -> Result<Vec<Instrument>> {
        let limit = self.config.instruments_page_limit.to_string();
        let mut instruments = Vec::new();
        let mut cursor = String::new();

        for _ in 0..MAX_INSTRUMENT_PAGES {
            let mut query = vec![("category", category), ("limit", limit.as_str())];
            if !cursor.is_empty() {
                query.push(("cursor", cursor.as_str()));
            }

            let page: InstrumentsResult = self
                .get(INSTRUMENTS_PATH, &query, self.config.list_timeout)
                .await?;
            instruments.extend(page.list);

            if page.next_page_cursor.is_empty() || page.next_page_cursor == cursor {
                return Ok(instruments);
            }
            cursor = page.next_page_cursor;
        }

        tracing::warn!(
            "Instrument listing still paginating after {} pages, using {} instruments",
            MAX_INSTRUMENT_PAGES,
            instruments.len()
        );
        Ok(instruments)
    }

    /// Latest USD open interest for one contract.
    ///
    /// Returns `Ok(None)` when the exchange answers with an empty list.
    ///
    /// # Errors
    /// Transport failures, non-success status or `retCode`, and a latest
    /// observation without a usable USD figure.
    pub async fn get_open_interest(&self, category: &str, symbol: &str) -> Result<Option<f64>> {
        let query = [
            ("category", category),
            ("symbol", symbol),
            ("intervalTime", self.config.open_interest_interval.as_str()),
            ("limit", "1"),
        ];

        let result: OpenInterestResult = self
            .get(OPEN_INTEREST_PATH, &query, self.config.symbol_timeout)
            .await?;

        let Some(latest) = result.list.into_iter().next() else {
            return Ok(None);
        };

        latest
            .open_interest_usd
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(Some)
            .ok_or_else(|| {
                BybitError::Serialization(format!("no USD open interest reported for {symbol}"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(uri: String) -> BybitClient {
        let config = BybitClientConfig::default()
            .with_base_url(uri)
            .with_request_interval(Duration::from_millis(1))
            .with_timeouts(Duration::from_secs(2), Duration::from_millis(300));
        BybitClient::new(config).unwrap()
    }

    #[test]
    fn test_default_config_matches_exchange_limits() {
        let config = BybitClientConfig::default();
        assert_eq!(config.base_url, BYBIT_API_URL);
        assert_eq!(config.request_interval, Duration::from_millis(120));
        assert_eq!(config.list_timeout, Duration::from_secs(15));
        assert_eq!(config.symbol_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_client_with_base_url() {
        let client = test_client("http://localhost:8080".to_string());
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[tokio::test]
    async fn test_get_instruments_single_page() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(INSTRUMENTS_PATH))
            .and(query_param("category", "linear"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "retCode": 0,
                "retMsg": "OK",
                "result": {
                    "category": "linear",
                    "list": [
                        {"symbol": "BTCUSDT", "status": "Trading"},
                        {"symbol": "ETHUSDT", "status": "Trading"}
                    ],
                    "nextPageCursor": ""
                }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = test_client(mock_server.uri());
        let instruments = client.get_instruments("linear").await.unwrap();

        assert_eq!(instruments.len(), 2);
        assert_eq!(instruments[0].symbol, "BTCUSDT");
    }

    #[tokio::test]
    async fn test_get_instruments_follows_cursor() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(INSTRUMENTS_PATH))
            .and(query_param("cursor", "page2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "retCode": 0,
                "retMsg": "OK",
                "result": {"list": [{"symbol": "SOLUSDT", "status": "Trading"}], "nextPageCursor": ""}
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path(INSTRUMENTS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "retCode": 0,
                "retMsg": "OK",
                "result": {"list": [{"symbol": "BTCUSDT", "status": "Trading"}], "nextPageCursor": "page2"}
            })))
            .mount(&mock_server)
            .await;

        let client = test_client(mock_server.uri());
        let instruments = client.get_instruments("linear").await.unwrap();

        let symbols: Vec<&str> = instruments.iter().map(|i| i.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BTCUSDT", "SOLUSDT"]);
    }

    #[tokio::test]
    async fn test_ret_code_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(INSTRUMENTS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "retCode": 10001,
                "retMsg": "params error",
                "result": {}
            })))
            .mount(&mock_server)
            .await;

        let client = test_client(mock_server.uri());
        let err = client.get_instruments("linear").await.unwrap_err();
        assert!(matches!(err, BybitError::RetCode { code: 10001, .. }));
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(INSTRUMENTS_PATH))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&mock_server)
            .await;

        let client = test_client(mock_server.uri());
        let err = client.get_instruments("linear").await.unwrap_err();
        assert!(matches!(err, BybitError::Api { status_code: 503, .. }));
        assert!(err.to_string().contains("maintenance"));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(INSTRUMENTS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&mock_server)
            .await;

        let client = test_client(mock_server.uri());
        let err = client.get_instruments("linear").await.unwrap_err();
        assert!(matches!(err, BybitError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_get_open_interest_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(OPEN_INTEREST_PATH))
            .and(query_param("category", "linear"))
            .and(query_param("symbol", "BTCUSDT"))
            .and(query_param("intervalTime", "5min"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "retCode": 0,
                "retMsg": "OK",
                "result": {
                    "symbol": "BTCUSDT",
                    "category": "linear",
                    "list": [{"openInterest": "1000", "openInterestUsd": "20000000", "timestamp": "1"}]
                }
            })))
            .mount(&mock_server)
            .await;

        let client = test_client(mock_server.uri());
        let oi = client.get_open_interest("linear", "BTCUSDT").await.unwrap();
        assert_eq!(oi, Some(20_000_000.0));
    }

    #[tokio::test]
    async fn test_get_open_interest_empty_list() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(OPEN_INTEREST_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "retCode": 0,
                "retMsg": "OK",
                "result": {"list": []}
            })))
            .mount(&mock_server)
            .await;

        let client = test_client(mock_server.uri());
        assert_eq!(client.get_open_interest("linear", "NEWUSDT").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_open_interest_missing_usd_value() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(OPEN_INTEREST_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "retCode": 0,
                "retMsg": "OK",
                "result": {"list": [{"openInterest": "1000"}]}
            })))
            .mount(&mock_server)
            .await;

        let client = test_client(mock_server.uri());
        let err = client.get_open_interest("linear", "BTCUSDT").await.unwrap_err();
        assert!(matches!(err, BybitError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(OPEN_INTEREST_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"retCode": 0, "result": {"list": []}}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&mock_server)
            .await;

        let client = test_client(mock_server.uri());
        let err = client.get_open_interest("linear", "BTCUSDT").await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_rate_limiter_spaces_requests() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(OPEN_INTEREST_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "retCode": 0,
                "result": {"list": [{"openInterestUsd": "1"}]}
            })))
            .expect(3)
            .mount(&mock_server)
            .await;

        let config = BybitClientConfig::default()
            .with_base_url(mock_server.uri())
            .with_request_interval(Duration::from_millis(100));
        let client = BybitClient::new(config).unwrap();

        let start = std::time::Instant::now();
        for _ in 0..3 {
            client.get_open_interest("linear", "BTCUSDT").await.unwrap();
        }

        // First permit is immediate, the next two wait one interval each.
        assert!(start.elapsed() >= Duration::from_millis(190));
    }
}
