//! Types for the aggregate price feed

use crate::error::FeedErrorKind;
use crate::math::Numeric;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Base/quote pair the feed polls, e.g. `CIRX/USDT`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradingPair {
    pub base: String,
    pub quote: String,
}

impl TradingPair {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into().to_uppercase(),
            quote: quote.into().to_uppercase(),
        }
    }
}

impl std::fmt::Display for TradingPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// A provider value that may arrive as a JSON number or as a string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LooseNumber {
    Number(f64),
    Text(String),
}

impl LooseNumber {
    /// True for empty or whitespace-only text
    pub fn is_blank(&self) -> bool {
        matches!(self, LooseNumber::Text(s) if s.trim().is_empty())
    }
}

impl Numeric for LooseNumber {
    fn to_finite(&self) -> Option<f64> {
        match self {
            LooseNumber::Number(n) => n.to_finite(),
            LooseNumber::Text(s) => s.to_finite(),
        }
    }
}

impl std::fmt::Display for LooseNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LooseNumber::Number(n) => write!(f, "{}", n),
            LooseNumber::Text(s) => f.write_str(s.trim()),
        }
    }
}

impl From<f64> for LooseNumber {
    fn from(value: f64) -> Self {
        LooseNumber::Number(value)
    }
}

impl From<&str> for LooseNumber {
    fn from(value: &str) -> Self {
        LooseNumber::Text(value.to_string())
    }
}

/// Raw aggregated market data as returned by a provider
///
/// Every field is optional; the reducer decides what is usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMarketData {
    #[serde(default)]
    pub average_price: Option<LooseNumber>,

    #[serde(default, rename = "totalVolumeUSDT")]
    pub total_volume_usdt: Option<LooseNumber>,

    #[serde(default)]
    pub circulating_supply: Option<LooseNumber>,

    #[serde(default)]
    pub average_fluctuation: Option<LooseNumber>,

    /// Volume in the base token, e.g. `totalVolumeCIRX`
    #[serde(default, alias = "totalVolumeCIRX")]
    pub total_volume_base: Option<LooseNumber>,
}

/// Where a snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotOrigin {
    Live,
    Fallback,
}

/// One immutable, fully populated market data reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    /// Price in quote currency, finite and non-negative
    pub price: f64,

    /// 24h volume ready for display, `"N/A"` when unknown
    pub volume_24h: String,

    pub circulating_supply: String,

    pub market_cap_usd: String,

    /// Signed 24h fluctuation, 0 when unknown
    pub fluctuation_percent: f64,

    /// Fluctuation ready for display, e.g. `"1.39%"`
    pub fluctuation: String,

    pub captured_at: DateTime<Utc>,

    pub origin: SnapshotOrigin,

    /// Version of the fallback values, `None` for live snapshots
    pub fallback_version: Option<u32>,
}

impl PriceSnapshot {
    /// Price with six decimals
    pub fn formatted_price(&self) -> String {
        format!("{:.6}", self.price)
    }

    pub fn trend_class(&self) -> TrendClass {
        TrendClass::from_fluctuation(self.fluctuation_percent)
    }
}

/// Direction of the 24h fluctuation, used for styling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendClass {
    Positive,
    Negative,
    Neutral,
}

impl TrendClass {
    pub fn from_fluctuation(percent: f64) -> Self {
        if percent > 0.0 {
            TrendClass::Positive
        } else if percent < 0.0 {
            TrendClass::Negative
        } else {
            TrendClass::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrendClass::Positive => "positive",
            TrendClass::Negative => "negative",
            TrendClass::Neutral => "neutral",
        }
    }
}

/// Scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedStatus {
    Idle,
    Running,
}

/// Result of one fetch cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A snapshot of the given origin was published
    Published(SnapshotOrigin),
    /// Another cycle was already in flight; nothing was done
    Skipped,
}

/// Feed events broadcast to subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedEvent {
    /// A snapshot was published
    SnapshotPublished {
        id: Uuid,
        pair: TradingPair,
        origin: SnapshotOrigin,
        old_price: Option<f64>,
        new_price: f64,
        timestamp: DateTime<Utc>,
    },

    /// A cycle failed and was covered by the fallback snapshot
    CycleFailed {
        id: Uuid,
        pair: TradingPair,
        kind: FeedErrorKind,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

impl FeedEvent {
    /// Get the event ID
    pub fn id(&self) -> Uuid {
        match self {
            FeedEvent::SnapshotPublished { id, .. } => *id,
            FeedEvent::CycleFailed { id, .. } => *id,
        }
    }

    /// Get the event type as string
    pub fn event_type(&self) -> &'static str {
        match self {
            FeedEvent::SnapshotPublished { .. } => "SNAPSHOT_PUBLISHED",
            FeedEvent::CycleFailed { .. } => "CYCLE_FAILED",
        }
    }
}

impl std::fmt::Display for FeedEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedEvent::SnapshotPublished {
                pair,
                origin,
                new_price,
                ..
            } => write!(f, "{} snapshot published ({:?}): {:.6}", pair, origin, new_price),
            FeedEvent::CycleFailed {
                pair,
                error_message,
                ..
            } => write!(f, "{} fetch cycle failed: {}", pair, error_message),
        }
    }
}

/// Overall health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Fresh live data
    Healthy,
    /// Serving fallback or stale data
    Degraded,
    /// Nothing published yet
    Unhealthy,
}

/// Component health information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component name
    pub name: String,
    /// Component status
    pub status: HealthStatus,
    /// Optional status message
    pub message: Option<String>,
    /// Component-specific details
    pub details: std::collections::HashMap<String, serde_json::Value>,
    /// Last checked timestamp
    pub last_checked: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_market_data_accepts_strings_and_numbers() {
        let raw: RawMarketData = serde_json::from_str(
            r#"{
                "averagePrice": "0.004400",
                "averageFluctuation": "-1.250",
                "totalVolumeCIRX": "8,079,101.00",
                "totalVolumeUSDT": "35,552.00",
                "circulatingSupply": 3380000000
            }"#,
        )
        .unwrap();

        assert_eq!(raw.average_price, Some(LooseNumber::from("0.004400")));
        assert_eq!(raw.circulating_supply, Some(LooseNumber::Number(3_380_000_000.0)));
        assert_eq!(raw.total_volume_usdt.unwrap().to_string(), "35,552.00");
        assert!(raw.total_volume_base.is_some());
    }

    #[test]
    fn test_raw_market_data_tolerates_missing_and_null() {
        let raw: RawMarketData =
            serde_json::from_str(r#"{"averagePrice": null, "unrelated": true}"#).unwrap();
        assert_eq!(raw, RawMarketData::default());
    }

    #[test]
    fn test_trend_class() {
        assert_eq!(TrendClass::from_fluctuation(1.39), TrendClass::Positive);
        assert_eq!(TrendClass::from_fluctuation(-0.01), TrendClass::Negative);
        assert_eq!(TrendClass::from_fluctuation(0.0), TrendClass::Neutral);
        assert_eq!(TrendClass::Negative.as_str(), "negative");
    }

    #[test]
    fn test_pair_is_uppercased() {
        let pair = TradingPair::new("cirx", "usdt");
        assert_eq!(pair.to_string(), "CIRX/USDT");
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = FeedEvent::CycleFailed {
            id: Uuid::new_v4(),
            pair: TradingPair::new("CIRX", "USDT"),
            kind: FeedErrorKind::MissingPrice,
            error_message: "no price".to_string(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "CYCLE_FAILED");
        assert_eq!(json["kind"], "missing_price");
        assert_eq!(event.event_type(), "CYCLE_FAILED");
    }
}
