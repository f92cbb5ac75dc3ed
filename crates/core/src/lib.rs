//! Core of the OI/MC alert service.
//!
//! Holds the per-run data model, the pure pipeline stages (symbol
//! normalization, ratio evaluation, message formatting), the traits the
//! data sources and notifiers implement, and configuration loading.

pub mod alert_formatter;
pub mod config;
pub mod config_loader;
pub mod evaluator;
pub mod health;
pub mod symbol;
pub mod traits;
pub mod types;

pub use alert_formatter::{AlertFormatter, MAX_ALERTS_IN_MESSAGE};
pub use config::{
    AlertConfig, AppConfig, BybitConfig, CoinGeckoConfig, ConfigError, ScheduleConfig,
    ServerConfig, TelegramConfig, TelegramCredentials,
};
pub use config_loader::{ConfigLoader, DEFAULT_CONFIG_PATH};
pub use evaluator::{evaluate, matched_symbols};
pub use health::{HealthSnapshot, HealthState, LastRun};
pub use symbol::{canonical_symbol, is_quote_contract, normalize_contract_symbol};
pub use traits::{MarketCapSource, Notifier, OpenInterestSource};
pub use types::{
    AssetSnapshot, DataSource, DeliveryStatus, MarketCaps, OpenInterestBatch, OpenInterestEntry,
    OpenInterestMap, RatioAlert, RunOutcome, RunReport,
};
