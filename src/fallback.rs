//! Fallback snapshot policy
//!
//! When a cycle cannot produce a live snapshot the feed publishes a fixed,
//! versioned one instead. The consumer can only tell the two apart through
//! [`SnapshotOrigin`].

use crate::{
    constants::{
        FALLBACK_FLUCTUATION_PERCENT, FALLBACK_PRICE, FALLBACK_VERSION, FALLBACK_VOLUME_24H,
        PLACEHOLDER_CIRCULATING_SUPPLY, PLACEHOLDER_MARKET_CAP,
    },
    math::{parse_non_negative, parse_percentage},
    types::{PriceSnapshot, SnapshotOrigin},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Known-good values substituted for a failed live read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackPolicy {
    pub version: u32,
    pub price: f64,
    pub volume_24h: String,
    pub circulating_supply: String,
    pub market_cap_usd: String,
    pub fluctuation_percent: f64,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            version: FALLBACK_VERSION,
            price: FALLBACK_PRICE,
            volume_24h: FALLBACK_VOLUME_24H.to_string(),
            circulating_supply: PLACEHOLDER_CIRCULATING_SUPPLY.to_string(),
            market_cap_usd: PLACEHOLDER_MARKET_CAP.to_string(),
            fluctuation_percent: FALLBACK_FLUCTUATION_PERCENT,
        }
    }
}

impl FallbackPolicy {
    /// Returns a copy with `price` replaced
    ///
    /// Invalid prices keep the current value so the policy can never produce
    /// a snapshot that breaks the non-negative, finite price invariant.
    pub fn with_price(mut self, price: f64) -> Self {
        if let Some(price) = parse_non_negative(&price, "fallback.price") {
            self.price = price;
        }
        self
    }

    /// Builds the fallback snapshot stamped with `now`
    ///
    /// A policy built by hand or deserialized may carry an invalid price; it is
    /// replaced by [`FALLBACK_PRICE`].
    pub fn snapshot(&self, now: DateTime<Utc>) -> PriceSnapshot {
        let price = parse_non_negative(&self.price, "fallback.price").unwrap_or(FALLBACK_PRICE);
        let fluctuation_percent = parse_percentage(&self.fluctuation_percent, 0.0);
        PriceSnapshot {
            price,
            volume_24h: self.volume_24h.clone(),
            circulating_supply: self.circulating_supply.clone(),
            market_cap_usd: self.market_cap_usd.clone(),
            fluctuation_percent,
            fluctuation: format!("{:.2}%", fluctuation_percent),
            captured_at: now,
            origin: SnapshotOrigin::Fallback,
            fallback_version: Some(self.version),
        }
    }
}
