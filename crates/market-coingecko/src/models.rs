//! CoinGecko `/coins/markets` response items.

use serde::Deserialize;

/// Name used when the provider omits one.
pub const UNKNOWN_NAME: &str = "?";

/// One entry of the markets listing. Every field is optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarketItem {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub market_cap: Option<f64>,
}

impl MarketItem {
    /// Decodes an item, returning `None` if its fields have the wrong types.
    #[must_use]
    pub fn from_value(value: serde_json::Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }

    /// Display name, falling back to [`UNKNOWN_NAME`].
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(UNKNOWN_NAME)
    }
}
