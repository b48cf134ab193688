//! Freshness classification, derived on every read

use crate::{constants::FRESHNESS_INTERVALS, types::PriceSnapshot};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Age of `snapshot` at `now`, zero if the clock moved backwards
pub fn snapshot_age(snapshot: &PriceSnapshot, now: DateTime<Utc>) -> Duration {
    now.signed_duration_since(snapshot.captured_at)
        .to_std()
        .unwrap_or(Duration::ZERO)
}

/// A snapshot is fresh while younger than two update intervals.
/// No snapshot is never fresh.
pub fn is_fresh(snapshot: Option<&PriceSnapshot>, now: DateTime<Utc>, interval: Duration) -> bool {
    let Some(snapshot) = snapshot else {
        return false;
    };
    let threshold = interval.saturating_mul(FRESHNESS_INTERVALS);
    snapshot_age(snapshot, now) < threshold
}
