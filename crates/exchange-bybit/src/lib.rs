//! Bybit integration for the OI/MC alert service.
//!
//! This crate provides:
//! - A rate-limited REST client for the public v5 market endpoints
//! - Discovery of tradeable USDT linear contracts (paginated)
//! - An [`oi_alert_core::OpenInterestSource`] that sweeps open interest per contract
//!
//! # Example
//!
//! ```ignore
//! use oi_alert_bybit::BybitOpenInterestSource;
//! use oi_alert_core::{BybitConfig, OpenInterestSource};
//!
//! #[tokio::main]
//! async fn main() -> oi_alert_bybit::Result<()> {
//!     let source = BybitOpenInterestSource::from_config(&BybitConfig::default())?;
//!     let batch = source.fetch_open_interest().await;
//!     println!("{} symbols, {} skipped", batch.len(), batch.skipped.len());
//!     Ok(())
//! }
//! ```
//!
//! # Rate Limiting
//!
//! All requests, including instrument pages, take a permit from a single
//! limiter that admits one request per `request_interval_ms`. Transport
//! errors, HTTP 429/5xx and retCode 10006 add an extra `error_backoff_ms`
//! pause before the next symbol.

pub mod client;
pub mod error;
pub mod open_interest;
pub mod types;

pub use client::{BybitClient, BybitClientConfig, BYBIT_API_URL};
pub use error::{BybitError, Result};
pub use open_interest::BybitOpenInterestSource;
pub use types::{Instrument, OpenInterestPoint};
