//! # Aggregate Price Feed
//!
//! Polls an external market data provider for a token pair, reduces the raw
//! response into a display-ready [`PriceSnapshot`], and keeps serving a fixed
//! fallback snapshot whenever the provider fails. Consumers never receive a
//! hard error: a failed read shows up only as `origin == Fallback` on the
//! snapshot plus a diagnostic record.
//!
//! ## Usage
//!
//! ```no_run
//! use aggregate_price_feed::{FeedConfig, PriceFeed, SnapshotOrigin};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = FeedConfig::from_env()?;
//! let feed = PriceFeed::from_config(config)?;
//! feed.start();
//!
//! if let Some(snapshot) = feed.current_snapshot().await {
//!     let label = match snapshot.origin {
//!         SnapshotOrigin::Live => "live",
//!         SnapshotOrigin::Fallback => "fallback",
//!     };
//!     println!("{} {} ({})", feed.pair(), snapshot.formatted_price(), label);
//! }
//!
//! feed.stop();
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! PriceFeed::start()
//!     ↓
//! Timer task (immediate cycle, then every 30s; overlapping cycles dropped)
//!     ↓
//! MarketDataClient (HTTP, cached, failover; bounded by request timeout)
//!     ↓
//! Reducer ── MissingPrice / provider error ──→ FallbackPolicy
//!     ↓                                              ↓
//! FeedStore (current snapshot, diagnostics) ←────────┘
//!     ↓
//! Your Code (current_snapshot, formatted_price, is_fresh, trend_class)
//! ```
//!
//! ## Configuration
//!
//! Defaults live in [`constants`]; [`FeedConfig::from_env`] overrides them
//! from `PRICE_FEED_*` environment variables.

pub mod config;
pub mod constants;
pub mod diagnostics;
pub mod error;
pub mod fallback;
pub mod feed;
pub mod freshness;
pub mod math;
pub mod metrics;
pub mod provider;
pub mod providers;
pub mod reducer;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use config::FeedConfig;
pub use diagnostics::{DiagnosticSink, MemorySink, TracingSink};
pub use error::{
    ConfigError, ErrorInfo, FeedError, FeedErrorKind, MalformedField, ProviderError,
    ReductionError,
};
pub use fallback::FallbackPolicy;
pub use feed::PriceFeed;
pub use metrics::FeedMetrics;
pub use provider::MarketDataClient;
pub use types::{
    ComponentHealth, CycleOutcome, FeedEvent, FeedStatus, HealthStatus, LooseNumber,
    PriceSnapshot, RawMarketData, SnapshotOrigin, TradingPair, TrendClass,
};
