//! Market data client implementations

pub mod cached;
pub mod failover;
pub mod http;

pub use cached::CachedClient;
pub use failover::FailoverClient;
pub use http::HttpMarketDataClient;
