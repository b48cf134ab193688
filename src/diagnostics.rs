//! Diagnostic sinks
//!
//! Failures never reach the consumer's error channel, so the feed hands them
//! to a sink supplied at construction instead of logging through a global.

use crate::{error::ErrorInfo, types::TradingPair};

/// Receives every failure a feed absorbs
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, pair: &TradingPair, info: &ErrorInfo);
}

/// Default sink: a `warn` level tracing event per failure
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, pair: &TradingPair, info: &ErrorInfo) {
        tracing::warn!(
            pair = %pair,
            kind = info.kind.as_str(),
            occurred_at = %info.occurred_at,
            error = %info.message,
            "Market data cycle degraded"
        );
    }
}

/// Sink that keeps everything in memory, useful for tests and debug views
#[derive(Debug, Default)]
pub struct MemorySink {
    records: std::sync::Mutex<Vec<ErrorInfo>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, oldest first
    pub fn records(&self) -> Vec<ErrorInfo> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl DiagnosticSink for MemorySink {
    fn record(&self, _pair: &TradingPair, info: &ErrorInfo) {
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        records.push(info.clone());
    }
}
