//! Symbol normalization shared by the market-data and exchange sources.
//!
//! The market-data provider reports bare tickers ("btc"), the exchange reports
//! contract identifiers ("BTCUSDT"). Both are reduced to the same uppercase base
//! ticker so they can be joined.

/// Returns true if `contract` is quoted in `quote_suffix` and has a base before it.
#[must_use]
pub fn is_quote_contract(contract: &str, quote_suffix: &str) -> bool {
    !quote_suffix.is_empty()
        && contract.len() > quote_suffix.len()
        && contract.ends_with(quote_suffix)
}

/// Removes exactly one trailing `quote_suffix` from `contract`.
///
/// Callers filter with [`is_quote_contract`] first; an identifier without the
/// suffix is returned unchanged.
#[must_use]
pub fn normalize_contract_symbol(contract: &str, quote_suffix: &str) -> String {
    contract
        .strip_suffix(quote_suffix)
        .unwrap_or(contract)
        .to_string()
}

/// Canonical form of a market-data ticker.
#[must_use]
pub fn canonical_symbol(raw: &str) -> String {
    raw.trim().to_uppercase()
}
