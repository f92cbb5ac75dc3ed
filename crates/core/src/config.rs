use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable holding the Telegram bot token.
pub const TELEGRAM_TOKEN_ENV: &str = "TELEGRAM_TOKEN";

/// Environment variable holding the destination chat id.
pub const CHAT_ID_ENV: &str = "CHAT_ID";

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required secret is absent or blank.
    #[error("missing required environment variable {0}")]
    MissingSecret(&'static str),

    /// A tunable is outside its valid range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub alert: AlertConfig,
    pub schedule: ScheduleConfig,
    pub coingecko: CoinGeckoConfig,
    pub bybit: BybitConfig,
    pub telegram: TelegramConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Assets at or above this market cap are ignored.
    pub market_cap_limit_usd: f64,
    /// Alert when open interest / market cap is strictly greater than this.
    pub ratio_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub interval_secs: u64,
    /// Run once immediately at startup instead of waiting for the first tick.
    pub run_on_start: bool,
    /// How long shutdown waits for an in-flight run before abandoning it.
    pub shutdown_grace_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoinGeckoConfig {
    pub api_url: String,
    pub vs_currency: String,
    pub per_page: u32,
    pub pages: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BybitConfig {
    pub api_url: String,
    pub category: String,
    pub quote_suffix: String,
    /// Instrument status value meaning "currently tradeable".
    pub trading_status: String,
    /// Minimum spacing between requests, shared by all workers.
    pub request_interval_ms: u64,
    pub max_concurrency: usize,
    pub list_timeout_secs: u64,
    pub symbol_timeout_secs: u64,
    /// Extra pause after a transport error on a single symbol.
    pub error_backoff_ms: u64,
    pub open_interest_interval: String,
    pub instruments_page_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub api_url: String,
    pub parse_mode: String,
    pub timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            alert: AlertConfig::default(),
            schedule: ScheduleConfig::default(),
            coingecko: CoinGeckoConfig::default(),
            bybit: BybitConfig::default(),
            telegram: TelegramConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 10000,
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            market_cap_limit_usd: 100_000_000.0,
            ratio_threshold: 0.25,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            run_on_start: true,
            shutdown_grace_secs: 30,
        }
    }
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.coingecko.com/api/v3".to_string(),
            vs_currency: "usd".to_string(),
            per_page: 250,
            pages: 1,
            timeout_secs: 15,
        }
    }
}

impl Default for BybitConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.bybit.com".to_string(),
            category: "linear".to_string(),
            quote_suffix: "USDT".to_string(),
            trading_status: "Trading".to_string(),
            request_interval_ms: 120,
            max_concurrency: 1,
            list_timeout_secs: 15,
            symbol_timeout_secs: 10,
            error_backoff_ms: 500,
            open_interest_interval: "5min".to_string(),
            instruments_page_limit: 1000,
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.telegram.org".to_string(),
            parse_mode: "Markdown".to_string(),
            timeout_secs: 15,
        }
    }
}

impl AppConfig {
    /// Checks that every tunable is usable.
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        let cap = self.alert.market_cap_limit_usd;
        if cap.is_nan() || cap <= 0.0 {
            return invalid("alert.market_cap_limit_usd must be positive");
        }
        let threshold = self.alert.ratio_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return invalid("alert.ratio_threshold must be a finite, non-negative number");
        }
        if self.schedule.interval_secs == 0 {
            return invalid("schedule.interval_secs must be at least 1");
        }
        if self.coingecko.per_page == 0 || self.coingecko.pages == 0 {
            return invalid("coingecko.per_page and coingecko.pages must be at least 1");
        }
        if self.bybit.quote_suffix.is_empty() {
            return invalid("bybit.quote_suffix must not be empty");
        }
        if self.bybit.max_concurrency == 0 {
            return invalid("bybit.max_concurrency must be at least 1");
        }
        if self.bybit.list_timeout_secs == 0 || self.bybit.symbol_timeout_secs == 0 {
            return invalid("bybit timeouts must be at least 1 second");
        }
        Ok(())
    }
}

/// Secrets needed to deliver alerts.
#[derive(Debug, Clone)]
pub struct TelegramCredentials {
    pub bot_token: SecretString,
    pub chat_id: String,
}

impl TelegramCredentials {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: SecretString::from(bot_token.into()),
            chat_id: chat_id.into(),
        }
    }

    /// Reads `TELEGRAM_TOKEN` and `CHAT_ID` from the environment.
    ///
    /// # Errors
    /// Returns `ConfigError::MissingSecret` if either is unset or blank.
    pub fn from_env() -> Result<Self, ConfigError> {
        let token = required_env(TELEGRAM_TOKEN_ENV)?;
        let chat_id = required_env(CHAT_ID_ENV)?;
        Ok(Self::new(token, chat_id))
    }
}

fn required_env(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(ConfigError::MissingSecret(name)),
    }
}
