//! Error types for the Bybit integration.
//!
//! Bybit reports failures two ways: the HTTP status, and a `retCode` field in
//! an otherwise successful response. Both are surfaced as distinct variants.

use thiserror::Error;

/// Errors that can occur when talking to Bybit.
#[derive(Debug, Error)]
pub enum BybitError {
    /// Connection-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// Request did not complete within its timeout.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// Non-success HTTP status.
    #[error("API error: {status_code} - {message}")]
    Api {
        /// HTTP status code.
        status_code: u16,
        /// Response body, if any.
        message: String,
    },

    /// HTTP 200 but `retCode != 0`.
    #[error("request rejected: retCode {code} - {message}")]
    RetCode {
        /// Bybit return code.
        code: i64,
        /// `retMsg` from the response.
        message: String,
    },

    /// Response body did not match the expected shape.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Client could not be constructed.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl BybitError {
    /// Creates an API error from status code and message.
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status_code,
            message: message.into(),
        }
    }

    /// Creates a return-code error.
    pub fn ret_code(code: i64, message: impl Into<String>) -> Self {
        Self::RetCode {
            code,
            message: message.into(),
        }
    }

    /// Returns true if the request never produced a usable HTTP response.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_))
    }

    /// Returns true if backing off before the next request is worthwhile.
    #[must_use]
    pub fn warrants_backoff(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Api { status_code, .. } => *status_code == 429 || *status_code >= 500,
            // 10006: too many visits
            Self::RetCode { code, .. } => *code == 10006,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for BybitError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::Serialization(err.to_string())
        } else if err.is_connect() {
            Self::Network(format!("connection failed: {err}"))
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BybitError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for Bybit operations.
pub type Result<T> = std::result::Result<T, BybitError>;
