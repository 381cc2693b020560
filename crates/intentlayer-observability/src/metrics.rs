//! Engine counters, serialized into the metrics snapshot.

use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct EngineMetrics {
    pub turns_processed: u64,
    pub turns_failed: u64,
    pub rank_calls: u64,
    pub rank_timeouts: u64,
    pub cache_fallbacks: u64,
    pub offline_fallbacks: u64,
    pub exhausted: u64,
    pub sessions_created: u64,
    pub sessions_evicted: u64,
    pub sessions_expired: u64,
    pub sessions_purged: u64,
    pub maintenance_runs: u64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share of rank calls that hit the deadline.
    pub fn timeout_rate(&self) -> f64 {
        if self.rank_calls == 0 {
            return 0.0;
        }
        self.rank_timeouts as f64 / self.rank_calls as f64
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
