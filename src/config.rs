//! Feed configuration
//!
//! `FeedConfig::default()` reproduces the compile-time constants. Deployments
//! that need a different pair, cadence or provider endpoint override them
//! through environment variables with [`FeedConfig::from_env`].

use crate::{
    constants::{
        CACHE_TTL_SECS, DEFAULT_BASE_SYMBOL, DEFAULT_QUOTE_SYMBOL, REQUEST_TIMEOUT_SECS,
        UPDATE_INTERVAL_SECS,
    },
    error::ConfigError,
    fallback::FallbackPolicy,
    types::TradingPair,
};
use std::time::Duration;

pub const ENV_BASE_SYMBOL: &str = "PRICE_FEED_BASE_SYMBOL";
pub const ENV_QUOTE_SYMBOL: &str = "PRICE_FEED_QUOTE_SYMBOL";
pub const ENV_INTERVAL_SECS: &str = "PRICE_FEED_INTERVAL_SECS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "PRICE_FEED_REQUEST_TIMEOUT_SECS";
pub const ENV_CACHE_TTL_SECS: &str = "PRICE_FEED_CACHE_TTL_SECS";
pub const ENV_PROVIDER_URL: &str = "PRICE_FEED_PROVIDER_URL";
pub const ENV_SURFACE_ERRORS: &str = "PRICE_FEED_SURFACE_ERRORS";

/// Settings for one feed instance
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    /// Pair to poll
    pub pair: TradingPair,
    /// Delay between scheduled fetch cycles
    pub update_interval: Duration,
    /// Upper bound on one provider call
    pub request_timeout: Duration,
    /// How long `CachedClient` reuses a response
    pub cache_ttl: Duration,
    /// Aggregation endpoint for `HttpMarketDataClient`
    pub provider_url: Option<String>,
    /// Expose provider failures through the public error signal
    pub surface_provider_errors: bool,
    /// Snapshot published when a cycle fails
    pub fallback: FallbackPolicy,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            pair: TradingPair::new(DEFAULT_BASE_SYMBOL, DEFAULT_QUOTE_SYMBOL),
            update_interval: Duration::from_secs(UPDATE_INTERVAL_SECS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            cache_ttl: Duration::from_secs(CACHE_TTL_SECS),
            provider_url: None,
            surface_provider_errors: false,
            fallback: FallbackPolicy::default(),
        }
    }
}

impl FeedConfig {
    /// Reads overrides from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup
    ///
    /// Unset or empty keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        let base = get(ENV_BASE_SYMBOL).unwrap_or_else(|| config.pair.base.clone());
        let quote = get(ENV_QUOTE_SYMBOL).unwrap_or_else(|| config.pair.quote.clone());
        config.pair = TradingPair::new(base.trim(), quote.trim());

        if let Some(value) = get(ENV_INTERVAL_SECS) {
            config.update_interval = parse_secs(ENV_INTERVAL_SECS, &value)?;
        }
        if let Some(value) = get(ENV_REQUEST_TIMEOUT_SECS) {
            config.request_timeout = parse_secs(ENV_REQUEST_TIMEOUT_SECS, &value)?;
        }
        if let Some(value) = get(ENV_CACHE_TTL_SECS) {
            config.cache_ttl = parse_secs(ENV_CACHE_TTL_SECS, &value)?;
        }
        if let Some(value) = get(ENV_SURFACE_ERRORS) {
            config.surface_provider_errors = parse_bool(ENV_SURFACE_ERRORS, &value)?;
        }
        config.provider_url = get(ENV_PROVIDER_URL).map(|url| url.trim().to_string());

        Ok(config)
    }

    pub fn with_pair(mut self, pair: TradingPair) -> Self {
        self.pair = pair;
        self
    }

    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn surface_provider_errors(mut self, surface: bool) -> Self {
        self.surface_provider_errors = surface;
        self
    }

    /// Cache TTL actually applied in front of the provider
    ///
    /// Capped at half the update interval, so every scheduled cycle reaches
    /// the provider instead of re-serving the previous tick's response.
    pub fn effective_cache_ttl(&self) -> Duration {
        self.cache_ttl.min(self.update_interval / 2)
    }
}

fn parse_secs(var: &'static str, value: &str) -> Result<Duration, ConfigError> {
    let secs: u64 = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        var,
        value: value.to_string(),
    })?;
    if secs == 0 {
        return Err(ConfigError::Zero(var));
    }
    Ok(Duration::from_secs(secs))
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
        }),
    }
}
