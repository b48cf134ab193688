//! Constants for the aggregate price feed
//!
//! Defaults for every `FeedConfig` field live here. The feed works with no
//! runtime configuration at all; `FeedConfig::from_env` only overrides these.

/// Default base symbol polled by the feed
pub const DEFAULT_BASE_SYMBOL: &str = "CIRX";

/// Default quote symbol polled by the feed
pub const DEFAULT_QUOTE_SYMBOL: &str = "USDT";

/// How often the scheduler runs a fetch cycle (in seconds)
pub const UPDATE_INTERVAL_SECS: u64 = 30;

/// A snapshot is fresh while younger than this many update intervals
pub const FRESHNESS_INTERVALS: u32 = 2;

/// Upper bound on a single provider call (in seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 5;

/// How long a cached provider response is reused (in seconds)
pub const CACHE_TTL_SECS: u64 = 30;

/// Capacity of the feed event broadcast channel
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Divisor used to express market cap in millions
pub const MARKET_CAP_DIVISOR: f64 = 1_000_000.0;

/// Divisor used to express circulating supply in billions
pub const SUPPLY_DIVISOR: f64 = 1_000_000_000.0;

/// Display value used when the provider reports no volume
pub const NOT_AVAILABLE: &str = "N/A";

/// Display value used when the provider reports no fluctuation
pub const DEFAULT_FLUCTUATION: &str = "0.00";

/// Placeholder market cap shown when it cannot be computed
pub const PLACEHOLDER_MARKET_CAP: &str = "$14.8M";

/// Placeholder circulating supply shown when the provider omits it
pub const PLACEHOLDER_CIRCULATING_SUPPLY: &str = "3.38B CIRX";

/// Version of the built-in fallback values below
pub const FALLBACK_VERSION: u32 = 1;

/// Fallback price, taken from recent BitMart data
pub const FALLBACK_PRICE: f64 = 0.004377;

/// Fallback 24h volume display string
pub const FALLBACK_VOLUME_24H: &str = "$35,552";

/// Fallback 24h fluctuation in percent
pub const FALLBACK_FLUCTUATION_PERCENT: f64 = 1.39;

/// User agent for HTTP requests
pub const USER_AGENT: &str = "aggregate-price-feed/0.1.0";
