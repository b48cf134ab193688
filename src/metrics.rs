//! Fetch cycle metrics
//!
//! Tracks cycle latency percentiles and how often the feed had to fall back.

use crate::types::SnapshotOrigin;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Maximum number of samples to keep for metrics calculation
const MAX_SAMPLES: usize = 100;

/// Metrics for one feed
#[derive(Debug, Clone, PartialEq)]
pub struct FeedMetrics {
    /// Name of the client behind the feed
    pub client_name: String,
    /// 50th percentile cycle latency in milliseconds
    pub latency_p50_ms: f64,
    /// 99th percentile cycle latency in milliseconds
    pub latency_p99_ms: f64,
    /// Share of completed cycles that published live data (0.0 to 1.0)
    pub live_rate: f64,
    /// Completed cycles (live + fallback)
    pub total_cycles: u64,
    /// Cycles that published the fallback snapshot
    pub fallback_cycles: u64,
    /// Triggers dropped because a cycle was already in flight
    pub skipped_cycles: u64,
}

impl FeedMetrics {
    /// Creates metrics with no data
    pub fn empty(client_name: &str) -> Self {
        Self {
            client_name: client_name.to_string(),
            latency_p50_ms: 0.0,
            latency_p99_ms: 0.0,
            live_rate: 1.0,
            total_cycles: 0,
            fallback_cycles: 0,
            skipped_cycles: 0,
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    total: u64,
    fallback: u64,
    skipped: u64,
}

/// Collects and computes metrics for a feed
pub struct MetricsCollector {
    client_name: String,
    /// Rolling window of cycle latencies in milliseconds
    samples: Arc<RwLock<VecDeque<f64>>>,
    counters: Arc<RwLock<Counters>>,
}

impl MetricsCollector {
    pub fn new(client_name: &str) -> Self {
        Self {
            client_name: client_name.to_string(),
            samples: Arc::new(RwLock::new(VecDeque::with_capacity(MAX_SAMPLES))),
            counters: Arc::new(RwLock::new(Counters::default())),
        }
    }

    /// Records a completed cycle with its duration and outcome
    pub async fn record_cycle(&self, duration: Duration, origin: SnapshotOrigin) {
        {
            let mut counters = self.counters.write().await;
            counters.total += 1;
            if origin == SnapshotOrigin::Fallback {
                counters.fallback += 1;
            }
        }

        let mut samples = self.samples.write().await;
        if samples.len() >= MAX_SAMPLES {
            samples.pop_front();
        }
        samples.push_back(duration.as_secs_f64() * 1000.0);
    }

    /// Records a trigger dropped by the in-flight guard
    pub async fn record_skip(&self) {
        self.counters.write().await.skipped += 1;
    }

    /// Computes current metrics from collected samples
    pub async fn get_metrics(&self) -> FeedMetrics {
        let counters = self.counters.read().await;
        let mut metrics = FeedMetrics::empty(&self.client_name);
        metrics.skipped_cycles = counters.skipped;

        if counters.total == 0 {
            return metrics;
        }

        let mut latencies: Vec<f64> = self.samples.read().await.iter().copied().collect();
        latencies.sort_by(|a, b| a.total_cmp(b));

        metrics.latency_p50_ms = percentile(&latencies, 50.0);
        metrics.latency_p99_ms = percentile(&latencies, 99.0);
        metrics.total_cycles = counters.total;
        metrics.fallback_cycles = counters.fallback;
        metrics.live_rate = (counters.total - counters.fallback) as f64 / counters.total as f64;
        metrics
    }
}

/// Nearest-rank percentile of sorted values
fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    let len = sorted_values.len();
    if len == 0 {
        return 0.0;
    }

    let rank = (p / 100.0 * len as f64).ceil().max(1.0) as usize;
    sorted_values[rank.min(len) - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_metrics_collector() {
        let collector = MetricsCollector::new("test");

        collector
            .record_cycle(Duration::from_millis(100), SnapshotOrigin::Live)
            .await;
        collector
            .record_cycle(Duration::from_millis(200), SnapshotOrigin::Live)
            .await;
        collector
            .record_cycle(Duration::from_millis(150), SnapshotOrigin::Fallback)
            .await;
        collector.record_skip().await;

        let metrics = collector.get_metrics().await;

        assert_eq!(metrics.client_name, "test");
        assert_eq!(metrics.total_cycles, 3);
        assert_eq!(metrics.fallback_cycles, 1);
        assert_eq!(metrics.skipped_cycles, 1);
        assert!(metrics.live_rate > 0.6 && metrics.live_rate < 0.7);
        assert_eq!(metrics.latency_p50_ms, 150.0);
    }

    #[tokio::test]
    async fn test_empty_metrics() {
        let collector = MetricsCollector::new("test");
        collector.record_skip().await;

        let metrics = collector.get_metrics().await;
        assert_eq!(metrics.total_cycles, 0);
        assert_eq!(metrics.skipped_cycles, 1);
        assert_eq!(metrics.live_rate, 1.0);
    }

    #[test]
    fn test_percentile() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        assert_eq!(percentile(&values, 50.0), 5.0);
        assert_eq!(percentile(&values, 99.0), 10.0);
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 100.0), 10.0);
        assert_eq!(percentile(&[], 50.0), 0.0);
    }
}
