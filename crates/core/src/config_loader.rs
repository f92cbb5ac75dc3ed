use crate::config::AppConfig;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};

/// Default location of the TOML configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/Config.toml";

/// Prefix for environment overrides, e.g. `OI_ALERT_ALERT__RATIO_THRESHOLD=0.3`.
pub const ENV_PREFIX: &str = "OI_ALERT_";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration by layering built-in defaults, the TOML file at `path`,
    /// an optional JSON file next to it (same stem, `.json`), and `OI_ALERT_`
    /// environment variables. Later layers win.
    /// A `PORT` variable set by the hosting platform wins over `server.port`.
    ///
    /// A missing file is not an error; defaults apply.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be parsed, a value has the wrong type,
    /// or the merged configuration fails validation.
    pub fn load_from(path: &str) -> Result<AppConfig> {
        let json_path = std::path::Path::new(path).with_extension("json");

        let mut config: AppConfig = Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Json::file(json_path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to load configuration from {path}"))?;

        if let Ok(port) = std::env::var("PORT") {
            config.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("PORT is not a valid port number: {port}"))?;
        }

        config.validate()?;
        tracing::debug!(
            "Configuration loaded from {} (threshold {}, market cap limit ${})",
            path,
            config.alert.ratio_threshold,
            config.alert.market_cap_limit_usd
        );
        Ok(config)
    }
}
