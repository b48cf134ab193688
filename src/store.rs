//! In-memory feed state
//!
//! Holds the single `FeedState` of one feed instance. Every publication
//! replaces the snapshot as a whole, so readers never see a partially
//! populated one.

use crate::{error::ErrorInfo, types::PriceSnapshot};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

/// Mutable state of one feed instance
#[derive(Debug, Clone, Default)]
pub struct FeedState {
    /// Latest published snapshot, `None` until the first cycle completes
    pub current: Option<PriceSnapshot>,

    /// Last failure, kept for diagnostics only
    pub last_failure: Option<ErrorInfo>,

    /// Error surfaced to the consumer, empty unless errors are surfaced
    pub error: Option<String>,
}

/// Single-owner store for a feed's state
pub struct FeedStore {
    state: RwLock<FeedState>,
}

impl FeedStore {
    /// Creates an empty store (no snapshot yet)
    pub fn new() -> Self {
        Self {
            state: RwLock::new(FeedState::default()),
        }
    }

    /// Clears the consumer-facing error at the start of a cycle
    pub async fn begin_cycle(&self) {
        self.state.write().await.error = None;
    }

    /// Publishes a live snapshot and clears the diagnostic failure
    ///
    /// # Returns
    /// The price of the snapshot that was replaced, if any
    pub async fn publish_live(&self, snapshot: PriceSnapshot) -> Option<f64> {
        let mut state = self.state.write().await;
        let old_price = state.current.as_ref().map(|s| s.price);
        state.current = Some(snapshot);
        state.last_failure = None;
        state.error = None;
        old_price
    }

    /// Publishes a fallback snapshot and records the failure behind it
    ///
    /// # Arguments
    /// * `snapshot` - The fallback snapshot
    /// * `failure` - What went wrong, retained for diagnostics
    /// * `surface` - Whether the failure is also exposed as the public error
    pub async fn publish_fallback(
        &self,
        snapshot: PriceSnapshot,
        failure: ErrorInfo,
        surface: bool,
    ) -> Option<f64> {
        let mut state = self.state.write().await;
        let old_price = state.current.as_ref().map(|s| s.price);
        state.current = Some(snapshot);
        state.error = surface.then(|| failure.message.clone());
        state.last_failure = Some(failure);
        old_price
    }

    /// Gets the current snapshot
    pub async fn current(&self) -> Option<PriceSnapshot> {
        self.state.read().await.current.clone()
    }

    pub async fn last_failure(&self) -> Option<ErrorInfo> {
        self.state.read().await.last_failure.clone()
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    /// When the current snapshot was captured
    pub async fn last_updated_at(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.current.as_ref().map(|s| s.captured_at)
    }

    /// Copy of the whole state
    pub async fn state(&self) -> FeedState {
        self.state.read().await.clone()
    }
}

impl Default for FeedStore {
    fn default() -> Self {
        Self::new()
    }
}
