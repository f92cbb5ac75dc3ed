//! Bybit v5 market-data response models.
//!
//! Bybit encodes most numeric fields as JSON strings; the lenient number
//! helper accepts either form.

use serde::{Deserialize, Deserializer};

/// Common v5 response envelope. `result` is decoded only after `retCode` is checked.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Envelope {
    pub ret_code: i64,
    #[serde(default)]
    pub ret_msg: String,
    #[serde(default)]
    pub result: serde_json::Value,
}

/// `result` of `GET /v5/market/instruments-info`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InstrumentsResult {
    #[serde(default)]
    pub list: Vec<Instrument>,
    #[serde(default)]
    pub next_page_cursor: String,
}

/// One contract from the instruments listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub symbol: String,
    #[serde(default)]
    pub status: String,
}

impl Instrument {
    /// True if the contract is quoted in `quote_suffix` and its status equals `trading_status`.
    #[must_use]
    pub fn is_tradeable(&self, quote_suffix: &str, trading_status: &str) -> bool {
        self.status == trading_status
            && oi_alert_core::is_quote_contract(&self.symbol, quote_suffix)
    }
}

/// `result` of `GET /v5/market/open-interest`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct OpenInterestResult {
    #[serde(default)]
    pub list: Vec<OpenInterestPoint>,
}

/// A single open-interest observation, newest first in the list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenInterestPoint {
    /// Open interest in USD as reported by the exchange.
    #[serde(
        rename = "openInterestUsd",
        alias = "openInterestValue",
        default,
        deserialize_with = "lenient_f64"
    )]
    pub open_interest_usd: Option<f64>,
}

fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }))
}
