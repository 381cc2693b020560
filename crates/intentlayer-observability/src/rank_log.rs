//! Rank performance log: intent, latency, candidate count, fallback taken.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A single rank log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankLogEntry {
    pub session_id: String,
    pub intent: String,
    pub latency: Duration,
    pub candidate_count: usize,
    /// Fallback used instead of a fresh ranking, if any.
    pub fallback: Option<String>,
    pub timestamp_epoch_ms: i64,
}

impl RankLogEntry {
    /// Create a new entry with the timestamp set to now.
    pub fn new(
        session_id: impl Into<String>,
        intent: impl Into<String>,
        latency: Duration,
        candidate_count: usize,
        fallback: Option<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            intent: intent.into(),
            latency,
            candidate_count,
            fallback,
            timestamp_epoch_ms: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Bounded log of rank calls.
#[derive(Debug, Clone)]
pub struct RankLog {
    entries: Vec<RankLogEntry>,
    max_entries: usize,
}

impl RankLog {
    pub fn new() -> Self {
        Self::with_capacity(10_000)
    }

    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_entries,
        }
    }

    pub fn record(&mut self, entry: RankLogEntry) {
        tracing::debug!(
            event = "rank_logged",
            session_id = %entry.session_id,
            intent = %entry.intent,
            latency_ms = entry.latency.as_millis() as u64,
            candidate_count = entry.candidate_count,
            fallback = ?entry.fallback,
            "rank logged"
        );

        self.entries.push(entry);
        if self.entries.len() > self.max_entries {
            self.entries.drain(..self.entries.len() - self.max_entries);
        }
    }

    pub fn entries(&self) -> &[RankLogEntry] {
        &self.entries
    }

    pub fn avg_latency(&self) -> Duration {
        if self.entries.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.entries.iter().map(|e| e.latency).sum();
        total / self.entries.len() as u32
    }

    /// Latency at the given percentile (0.0 to 1.0).
    pub fn latency_percentile(&self, p: f64) -> Duration {
        if self.entries.is_empty() {
            return Duration::ZERO;
        }
        let mut latencies: Vec<Duration> = self.entries.iter().map(|e| e.latency).collect();
        latencies.sort();
        let idx = ((p * (latencies.len() - 1) as f64).round() as usize).min(latencies.len() - 1);
        latencies[idx]
    }

    /// Fraction of logged calls that took a fallback.
    pub fn fallback_rate(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        let fallbacks = self.entries.iter().filter(|e| e.fallback.is_some()).count();
        fallbacks as f64 / self.entries.len() as f64
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }
}

impl Default for RankLog {
    fn default() -> Self {
        Self::new()
    }
}
