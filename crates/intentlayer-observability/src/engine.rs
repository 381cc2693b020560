//! [`ObservabilityEngine`] owns metrics, the rank log and degradation tracking.

use intentlayer_core::errors::{IntentLayerError, IntentLayerResult};

use crate::degradation::{DegradationEvent, DegradationTracker};
use crate::metrics::EngineMetrics;
use crate::rank_log::{RankLog, RankLogEntry};

#[derive(Debug, Default)]
pub struct ObservabilityEngine {
    pub metrics: EngineMetrics,
    pub degradation: DegradationTracker,
    pub rank_log: RankLog,
}

impl ObservabilityEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_rank(&mut self, entry: RankLogEntry) {
        self.metrics.rank_calls += 1;
        self.rank_log.record(entry);
    }

    pub fn record_degradation(&mut self, event: DegradationEvent) {
        self.degradation.record(event);
    }

    pub fn mark_recovered(&mut self, component: &str) {
        self.degradation.mark_recovered(component);
    }

    /// Current metrics and rank-log summary as JSON.
    pub fn metrics_snapshot(&self) -> IntentLayerResult<serde_json::Value> {
        let metrics_json =
            serde_json::to_value(&self.metrics).map_err(IntentLayerError::SerializationError)?;
        Ok(serde_json::json!({
            "metrics": metrics_json,
            "rank_log_count": self.rank_log.count(),
            "rank_avg_latency_ms": self.rank_log.avg_latency().as_millis() as u64,
            "rank_p95_latency_ms": self.rank_log.latency_percentile(0.95).as_millis() as u64,
            "fallback_rate": self.rank_log.fallback_rate(),
            "active_degradations": self.degradation.active_degradations().len(),
        }))
    }
}
