//! HTTP market data client
//!
//! Talks to an aggregation endpoint that answers
//! `GET {endpoint}?base=CIRX&quote=USDT` with a JSON `RawMarketData` body.

use crate::{
    constants::{REQUEST_TIMEOUT_SECS, USER_AGENT},
    error::ProviderError,
    provider::MarketDataClient,
    types::{RawMarketData, TradingPair},
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Market data client backed by a JSON HTTP endpoint
pub struct HttpMarketDataClient {
    client: Client,
    endpoint: String,
}

impl HttpMarketDataClient {
    /// Creates a client with the default request timeout
    pub fn new(endpoint: impl Into<String>) -> Result<Self, ProviderError> {
        Self::with_timeout(endpoint, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    /// Creates a client with a custom request timeout
    pub fn with_timeout(
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(ProviderError::NetworkError)?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Builds the request URL for a pair
    fn build_url(&self, pair: &TradingPair) -> String {
        let separator = if self.endpoint.contains('?') { '&' } else { '?' };
        format!(
            "{}{}base={}&quote={}",
            self.endpoint, separator, pair.base, pair.quote
        )
    }

    /// Parses a response body, rejecting payloads with no usable content
    fn parse_body(body: &str, pair: &TradingPair) -> Result<RawMarketData, ProviderError> {
        let data: Option<RawMarketData> = serde_json::from_str(body).map_err(|e| {
            ProviderError::InvalidResponse(format!(
                "Failed to parse market data response: {}. Response: {}",
                e, body
            ))
        })?;

        // The aggregation service answers `null` when no exchange responded
        data.ok_or_else(|| ProviderError::NoData(pair.to_string()))
    }
}

#[async_trait]
impl MarketDataClient for HttpMarketDataClient {
    async fn get_market_data(&self, pair: &TradingPair) -> Result<RawMarketData, ProviderError> {
        let url = self.build_url(pair);
        tracing::debug!(url = %url, "Fetching market data");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout
            } else {
                ProviderError::NetworkError(e)
            }
        })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimitExceeded);
        }

        if !status.is_success() {
            return Err(ProviderError::ApiError(format!(
                "HTTP {}: {}",
                status,
                response.text().await.unwrap_or_default()
            )));
        }

        let body = response.text().await.map_err(ProviderError::NetworkError)?;
        let data = Self::parse_body(&body, pair)?;

        tracing::debug!(pair = %pair, "Fetched market data");
        Ok(data)
    }

    fn client_name(&self) -> &'static str {
        "http"
    }
}
