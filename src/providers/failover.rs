//! Failover market data client

use crate::{
    error::ProviderError,
    provider::MarketDataClient,
    types::{RawMarketData, TradingPair},
};
use async_trait::async_trait;
use std::sync::Arc;

/// Client that asks several clients in order until one succeeds
pub struct FailoverClient {
    clients: Vec<Arc<dyn MarketDataClient>>,
}

impl FailoverClient {
    /// The clients are tried in the order they are provided.
    pub fn new(clients: Vec<Arc<dyn MarketDataClient>>) -> Self {
        Self { clients }
    }
}

#[async_trait]
impl MarketDataClient for FailoverClient {
    async fn get_market_data(&self, pair: &TradingPair) -> Result<RawMarketData, ProviderError> {
        let mut last_error = None;

        for client in &self.clients {
            match client.get_market_data(pair).await {
                Ok(data) => return Ok(data),
                Err(e) => {
                    tracing::warn!(
                        client = client.client_name(),
                        pair = %pair,
                        error = %e,
                        "Client failed to fetch market data"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ProviderError::InvalidResponse("No clients configured for failover".to_string())
        }))
    }

    fn client_name(&self) -> &'static str {
        "failover"
    }
}
