//! Market data client abstraction
//!
//! The feed treats the provider as opaque: whatever aggregation happens across
//! exchanges is the implementation's business. The feed only needs one call
//! per cycle that either yields raw data or fails.

use crate::{
    error::ProviderError,
    types::{RawMarketData, TradingPair},
};
use async_trait::async_trait;

/// Trait for market data clients
///
/// Implementations may fail, time out, or return partial data. The feed
/// absorbs all three.
#[async_trait]
pub trait MarketDataClient: Send + Sync {
    /// Fetches the current aggregated market data for a pair
    ///
    /// # Arguments
    /// * `pair` - The base/quote pair to fetch
    ///
    /// # Returns
    /// Raw market data, or an error if the provider could not be reached
    async fn get_market_data(&self, pair: &TradingPair) -> Result<RawMarketData, ProviderError>;

    /// Returns the name of this client
    fn client_name(&self) -> &'static str;
}
