//! CoinGecko market-cap source.
//!
//! Fetches the markets listing ranked by market cap and keeps the assets
//! below the configured ceiling, keyed by uppercase ticker.

pub mod client;
pub mod models;
pub mod source;

pub use client::{CoinGeckoClient, COINGECKO_API_URL};
pub use models::MarketItem;
pub use source::{retain_small_caps, CoinGeckoMarketSource};
