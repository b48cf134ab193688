//! Polling price feed
//!
//! `PriceFeed` owns one `FeedState` and the timer that refreshes it. The
//! scheduler has two states:
//!
//! ```text
//! Idle --start()--> Running --stop() / drop--> Idle
//! ```
//!
//! `start()` runs one fetch cycle immediately and then one per update interval.
//! A cycle that is triggered while another is still in flight is dropped, not
//! queued. Failed cycles publish the fallback snapshot; nothing is retried
//! until the next tick.

use crate::{
    config::FeedConfig,
    constants::{EVENT_CHANNEL_CAPACITY, UPDATE_INTERVAL_SECS},
    diagnostics::{DiagnosticSink, TracingSink},
    error::{ConfigError, ErrorInfo, FeedError, ProviderError},
    freshness,
    metrics::{FeedMetrics, MetricsCollector},
    provider::MarketDataClient,
    providers::{CachedClient, HttpMarketDataClient},
    reducer::{reduce_detailed, Reduced},
    store::{FeedState, FeedStore},
    types::{
        ComponentHealth, CycleOutcome, FeedEvent, FeedStatus, HealthStatus, PriceSnapshot,
        SnapshotOrigin, TradingPair, TrendClass,
    },
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

/// Resilient price feed for a single pair
///
/// # Example
/// ```no_run
/// use aggregate_price_feed::{FeedConfig, PriceFeed};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let feed = PriceFeed::from_config(FeedConfig::from_env()?)?;
/// feed.start();
///
/// println!("{} ({:?})", feed.formatted_price().await, feed.trend_class().await);
///
/// feed.stop();
/// # Ok(())
/// # }
/// ```
pub struct PriceFeed {
    inner: Arc<FeedInner>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

struct FeedInner {
    config: FeedConfig,
    client: Arc<dyn MarketDataClient>,
    store: FeedStore,
    metrics: MetricsCollector,
    sink: Arc<dyn DiagnosticSink>,
    in_flight: AtomicBool,
    events: broadcast::Sender<FeedEvent>,
}

/// Holds the in-flight flag for the duration of one cycle
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl PriceFeed {
    /// Creates an idle feed that logs diagnostics through `tracing`
    pub fn new(client: Arc<dyn MarketDataClient>, config: FeedConfig) -> Self {
        Self::with_sink(client, config, Arc::new(TracingSink))
    }

    /// Creates an idle feed with a custom diagnostic sink
    pub fn with_sink(
        client: Arc<dyn MarketDataClient>,
        mut config: FeedConfig,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        if config.update_interval.is_zero() {
            tracing::warn!(
                default_secs = UPDATE_INTERVAL_SECS,
                "Zero update interval, using default"
            );
            config.update_interval = Duration::from_secs(UPDATE_INTERVAL_SECS);
        }

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let metrics = MetricsCollector::new(client.client_name());

        Self {
            inner: Arc::new(FeedInner {
                config,
                client,
                store: FeedStore::new(),
                metrics,
                sink,
                in_flight: AtomicBool::new(false),
                events,
            }),
            timer: Mutex::new(None),
        }
    }

    /// Creates a feed backed by the HTTP client at `config.provider_url`
    ///
    /// Responses are cached for [`FeedConfig::effective_cache_ttl`], which
    /// stays below the update interval so each tick fetches fresh data.
    pub fn from_config(config: FeedConfig) -> Result<Self, ConfigError> {
        let url = config
            .provider_url
            .clone()
            .ok_or(ConfigError::MissingValue(crate::config::ENV_PROVIDER_URL))?;

        let http = HttpMarketDataClient::with_timeout(url, config.request_timeout)
            .map_err(|e| ConfigError::Client(e.to_string()))?;
        let client = CachedClient::with_ttl(Arc::new(http), config.effective_cache_ttl());

        Ok(Self::new(Arc::new(client), config))
    }

    /// Starts polling
    ///
    /// Runs one cycle immediately, then one every update interval. Calling
    /// `start()` on a running feed does nothing. Must be called from within a
    /// tokio runtime.
    pub fn start(&self) {
        let mut timer = self.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if timer.as_ref().is_some_and(|handle| !handle.is_finished()) {
            tracing::debug!(pair = %self.inner.config.pair, "Price feed already running");
            return;
        }

        let period = self.inner.config.update_interval;
        tracing::info!(
            pair = %self.inner.config.pair,
            client = self.inner.client.client_name(),
            update_interval_secs = period.as_secs(),
            "Starting price feed"
        );

        FeedInner::spawn_cycle(&self.inner);

        let inner = self.inner.clone();
        *timer = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                FeedInner::spawn_cycle(&inner);
            }
        }));
    }

    /// Stops polling
    ///
    /// Cancels the timer only. A cycle already in flight runs to completion
    /// and still publishes its result. Safe to call at any time.
    pub fn stop(&self) {
        let mut timer = self.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = timer.take() {
            handle.abort();
            tracing::info!(pair = %self.inner.config.pair, "Stopped price feed");
        }
    }

    /// Whether the timer is running
    pub fn status(&self) -> FeedStatus {
        let timer = self.timer.lock().unwrap_or_else(PoisonError::into_inner);
        match timer.as_ref() {
            Some(handle) if !handle.is_finished() => FeedStatus::Running,
            _ => FeedStatus::Idle,
        }
    }

    /// Runs one fetch cycle now, subject to the in-flight guard
    pub async fn force_fetch_now(&self) -> CycleOutcome {
        self.inner.run_cycle().await
    }

    /// Latest snapshot, `None` until the first cycle completes
    pub async fn current_snapshot(&self) -> Option<PriceSnapshot> {
        self.inner.store.current().await
    }

    /// True while a fetch cycle is in flight
    pub fn is_fetching(&self) -> bool {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    /// Last absorbed failure, for diagnostics only
    pub async fn last_failure(&self) -> Option<ErrorInfo> {
        self.inner.store.last_failure().await
    }

    /// Error exposed to the consumer
    ///
    /// Stays empty on the fallback path unless
    /// `FeedConfig::surface_provider_errors` is set.
    pub async fn error(&self) -> Option<String> {
        self.inner.store.error().await
    }

    /// Capture time of the current snapshot
    pub async fn last_updated_at(&self) -> Option<chrono::DateTime<Utc>> {
        self.inner.store.last_updated_at().await
    }

    /// Current price with six decimals, `"0.000000"` when unset
    pub async fn formatted_price(&self) -> String {
        self.current_snapshot()
            .await
            .map(|s| s.formatted_price())
            .unwrap_or_else(|| format!("{:.6}", 0.0))
    }

    /// Whether the current snapshot is younger than two update intervals
    pub async fn is_fresh(&self) -> bool {
        let snapshot = self.current_snapshot().await;
        freshness::is_fresh(snapshot.as_ref(), Utc::now(), self.inner.config.update_interval)
    }

    /// Display trend of the current fluctuation, neutral when unset
    pub async fn trend_class(&self) -> TrendClass {
        self.current_snapshot()
            .await
            .map(|s| s.trend_class())
            .unwrap_or(TrendClass::Neutral)
    }

    /// Copy of the whole feed state
    pub async fn state(&self) -> FeedState {
        self.inner.store.state().await
    }

    /// Subscribes to feed events
    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.inner.events.subscribe()
    }

    /// Cycle latency and fallback metrics
    pub async fn metrics(&self) -> FeedMetrics {
        self.inner.metrics.get_metrics().await
    }

    /// Pair this feed polls
    pub fn pair(&self) -> &TradingPair {
        &self.inner.config.pair
    }

    /// Name of the underlying market data client
    pub fn client_name(&self) -> &str {
        self.inner.client.client_name()
    }

    /// Perform a health check on the feed
    ///
    /// Healthy with fresh live data, degraded on fallback or stale data,
    /// unhealthy before anything was published.
    pub async fn health_check(&self) -> ComponentHealth {
        let snapshot = self.current_snapshot().await;
        let fresh = self.is_fresh().await;
        let metrics = self.metrics().await;
        let now = Utc::now();

        let mut details = HashMap::new();
        details.insert("pair".to_string(), serde_json::json!(self.pair().to_string()));
        details.insert("client_name".to_string(), serde_json::json!(self.client_name()));
        details.insert("fresh".to_string(), serde_json::json!(fresh));
        details.insert(
            "fallback_cycles".to_string(),
            serde_json::json!(metrics.fallback_cycles),
        );
        if let Some(snapshot) = &snapshot {
            details.insert("origin".to_string(), serde_json::json!(snapshot.origin));
            details.insert(
                "age_secs".to_string(),
                serde_json::json!(freshness::snapshot_age(snapshot, now).as_secs()),
            );
        }

        let (status, message) = match &snapshot {
            None => (
                HealthStatus::Unhealthy,
                "Price feed has not published a snapshot yet".to_string(),
            ),
            Some(s) if s.origin == SnapshotOrigin::Fallback => (
                HealthStatus::Degraded,
                "Price feed is serving fallback data".to_string(),
            ),
            Some(_) if !fresh => (
                HealthStatus::Degraded,
                "Price feed data is stale".to_string(),
            ),
            Some(_) => (
                HealthStatus::Healthy,
                "Price feed is operational with fresh data".to_string(),
            ),
        };

        ComponentHealth {
            name: "price_feed".to_string(),
            status,
            message: Some(message),
            details,
            last_checked: now,
        }
    }
}

impl Drop for PriceFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

impl FeedInner {
    fn spawn_cycle(inner: &Arc<Self>) {
        let inner = inner.clone();
        tokio::spawn(async move {
            inner.run_cycle().await;
        });
    }

    /// One fetch cycle: fetch, reduce, publish live or fallback
    async fn run_cycle(&self) -> CycleOutcome {
        let pair = &self.config.pair;
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            tracing::debug!(pair = %pair, "Fetch cycle already in flight, skipping");
            self.metrics.record_skip().await;
            return CycleOutcome::Skipped;
        };

        let start = Instant::now();
        self.store.begin_cycle().await;

        let origin = match self.fetch_and_reduce().await {
            Ok(Reduced {
                snapshot,
                malformed,
            }) => {
                for field in malformed {
                    let info = ErrorInfo::new(&FeedError::from(field), snapshot.captured_at);
                    self.sink.record(pair, &info);
                }

                let new_price = snapshot.price;
                let timestamp = snapshot.captured_at;
                let old_price = self.store.publish_live(snapshot).await;
                tracing::debug!(
                    pair = %pair,
                    price = new_price,
                    latency_ms = start.elapsed().as_millis() as u64,
                    "Published live snapshot"
                );
                self.emit(FeedEvent::SnapshotPublished {
                    id: Uuid::new_v4(),
                    pair: pair.clone(),
                    origin: SnapshotOrigin::Live,
                    old_price,
                    new_price,
                    timestamp,
                });
                SnapshotOrigin::Live
            }
            Err(error) => {
                let now = Utc::now();
                let info = ErrorInfo::new(&error, now);
                self.sink.record(pair, &info);

                let snapshot = self.config.fallback.snapshot(now);
                let new_price = snapshot.price;
                self.emit(FeedEvent::CycleFailed {
                    id: Uuid::new_v4(),
                    pair: pair.clone(),
                    kind: info.kind,
                    error_message: info.message.clone(),
                    timestamp: now,
                });

                let old_price = self
                    .store
                    .publish_fallback(snapshot, info, self.config.surface_provider_errors)
                    .await;
                tracing::debug!(pair = %pair, price = new_price, "Published fallback snapshot");
                self.emit(FeedEvent::SnapshotPublished {
                    id: Uuid::new_v4(),
                    pair: pair.clone(),
                    origin: SnapshotOrigin::Fallback,
                    old_price,
                    new_price,
                    timestamp: now,
                });
                SnapshotOrigin::Fallback
            }
        };

        self.metrics.record_cycle(start.elapsed(), origin).await;
        CycleOutcome::Published(origin)
    }

    /// Calls the client under the request timeout and reduces the response
    async fn fetch_and_reduce(&self) -> Result<Reduced, FeedError> {
        let raw = tokio::time::timeout(
            self.config.request_timeout,
            self.client.get_market_data(&self.config.pair),
        )
        .await
        .map_err(|_| ProviderError::Timeout)??;

        Ok(reduce_detailed(&raw, &self.config.pair, Utc::now())?)
    }

    fn emit(&self, event: FeedEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}
