//! Caching decorator for market data clients

use crate::{
    constants::CACHE_TTL_SECS,
    error::ProviderError,
    provider::MarketDataClient,
    types::{RawMarketData, TradingPair},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

struct CacheEntry {
    fetched_at: Instant,
    data: RawMarketData,
}

/// Reuses the last successful response per pair while it is younger than the TTL
///
/// Failures are never cached, so a failed call is retried on the next request.
pub struct CachedClient {
    inner: Arc<dyn MarketDataClient>,
    ttl: Duration,
    entries: RwLock<HashMap<TradingPair, CacheEntry>>,
}

impl CachedClient {
    pub fn new(inner: Arc<dyn MarketDataClient>) -> Self {
        Self::with_ttl(inner, Duration::from_secs(CACHE_TTL_SECS))
    }

    pub fn with_ttl(inner: Arc<dyn MarketDataClient>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Drops every cached response
    pub async fn invalidate(&self) {
        self.entries.write().await.clear();
    }

    async fn cached(&self, pair: &TradingPair) -> Option<RawMarketData> {
        let entries = self.entries.read().await;
        entries
            .get(pair)
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| entry.data.clone())
    }
}

#[async_trait]
impl MarketDataClient for CachedClient {
    async fn get_market_data(&self, pair: &TradingPair) -> Result<RawMarketData, ProviderError> {
        if let Some(data) = self.cached(pair).await {
            tracing::debug!(pair = %pair, "Using cached market data");
            return Ok(data);
        }

        let data = self.inner.get_market_data(pair).await?;
        self.entries.write().await.insert(
            pair.clone(),
            CacheEntry {
                fetched_at: Instant::now(),
                data: data.clone(),
            },
        );
        Ok(data)
    }

    fn client_name(&self) -> &'static str {
        self.inner.client_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::mock::{MockClient, MockFailure, MockResponse};

    fn pair() -> TradingPair {
        TradingPair::new("CIRX", "USDT")
    }

    #[tokio::test(start_paused = true)]
    async fn test_hit_within_ttl_and_refetch_after() {
        let mock = MockClient::new();
        let client = CachedClient::with_ttl(Arc::new(mock.clone()), Duration::from_secs(30));

        client.get_market_data(&pair()).await.unwrap();
        tokio::time::advance(Duration::from_secs(29)).await;
        client.get_market_data(&pair()).await.unwrap();
        assert_eq!(mock.call_count(), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        client.get_market_data(&pair()).await.unwrap();
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_not_cached() {
        let mock = MockClient::new();
        mock.push(MockResponse::Error(MockFailure::Timeout));
        let client = CachedClient::new(Arc::new(mock.clone()));

        assert!(client.get_market_data(&pair()).await.is_err());
        assert!(client.get_market_data(&pair()).await.is_ok());
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_pairs_are_cached_separately() {
        let mock = MockClient::new();
        let client = CachedClient::new(Arc::new(mock.clone()));

        client.get_market_data(&pair()).await.unwrap();
        client
            .get_market_data(&TradingPair::new("BTC", "USDT"))
            .await
            .unwrap();
        assert_eq!(mock.call_count(), 2);

        client.invalidate().await;
        client.get_market_data(&pair()).await.unwrap();
        assert_eq!(mock.call_count(), 3);
    }
}
