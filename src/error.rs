//! Error types for the aggregate price feed
//!
//! None of these ever reach the feed's consumer as a hard failure. Provider and
//! reduction errors are absorbed by the fallback policy, malformed fields only
//! degrade one display value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when fetching market data from a provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network request failed
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Invalid response from provider
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Provider API error (non-2xx status)
    #[error("Provider API error: {0}")]
    ApiError(String),

    /// Timeout waiting for response
    #[error("Request timeout")]
    Timeout,

    /// Provider answered but had nothing for the pair
    #[error("No market data available for {0}")]
    NoData(String),
}

/// Failure to turn a raw provider response into a snapshot
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReductionError {
    /// `averagePrice` absent, unparsable, non-finite or negative
    #[error("Missing or invalid average price (raw: {raw:?})")]
    MissingPrice { raw: Option<String> },
}

impl ReductionError {
    /// Creates a MissingPrice error
    pub fn missing_price(raw: Option<String>) -> Self {
        Self::MissingPrice { raw }
    }
}

/// An optional provider field that was present but could not be used
#[derive(Debug, Error, Clone, PartialEq)]
#[error("Malformed field {field}: {value:?}")]
pub struct MalformedField {
    pub field: &'static str,
    pub value: String,
}

/// Everything a fetch cycle can run into
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(#[from] ProviderError),

    #[error(transparent)]
    MissingPrice(#[from] ReductionError),

    #[error(transparent)]
    MalformedField(#[from] MalformedField),
}

impl FeedError {
    /// Classifies the error for diagnostics
    pub fn kind(&self) -> FeedErrorKind {
        match self {
            FeedError::ProviderUnavailable(_) => FeedErrorKind::ProviderUnavailable,
            FeedError::MissingPrice(_) => FeedErrorKind::MissingPrice,
            FeedError::MalformedField(_) => FeedErrorKind::MalformedField,
        }
    }
}

/// Error taxonomy as seen by diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedErrorKind {
    ProviderUnavailable,
    MissingPrice,
    MalformedField,
}

impl FeedErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedErrorKind::ProviderUnavailable => "provider_unavailable",
            FeedErrorKind::MissingPrice => "missing_price",
            FeedErrorKind::MalformedField => "malformed_field",
        }
    }
}

/// Diagnostic record of a failure, retained after the fact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: FeedErrorKind,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

impl ErrorInfo {
    pub fn new(error: &FeedError, occurred_at: DateTime<Utc>) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
            occurred_at,
        }
    }
}

/// Errors raised while reading `FeedConfig` from the environment
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{0} is not set")]
    MissingValue(&'static str),

    #[error("Failed to build market data client: {0}")]
    Client(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let provider = FeedError::from(ProviderError::Timeout);
        assert_eq!(provider.kind(), FeedErrorKind::ProviderUnavailable);

        let missing = FeedError::from(ReductionError::missing_price(None));
        assert_eq!(missing.kind(), FeedErrorKind::MissingPrice);

        let malformed = FeedError::from(MalformedField {
            field: "circulatingSupply",
            value: "lots".to_string(),
        });
        assert_eq!(malformed.kind(), FeedErrorKind::MalformedField);
    }

    #[test]
    fn test_error_info_keeps_message() {
        let now = Utc::now();
        let info = ErrorInfo::new(&FeedError::from(ProviderError::RateLimitExceeded), now);
        assert_eq!(info.kind, FeedErrorKind::ProviderUnavailable);
        assert_eq!(info.message, "Provider unavailable: Rate limit exceeded");
        assert_eq!(info.occurred_at, now);
    }
}
