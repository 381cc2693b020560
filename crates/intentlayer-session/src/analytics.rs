//! Per-session analytics: intent distribution, template usage, rank latency.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionAnalytics {
    /// Intent → turns within this session.
    pub intent_distribution: HashMap<String, u64>,
    /// Template name → times composed within this session.
    pub template_usage: HashMap<String, u64>,
    /// Rank latencies in milliseconds.
    pub rank_latencies_ms: Vec<f64>,
}

impl SessionAnalytics {
    pub fn record_intent(&mut self, intent: &str) {
        *self
            .intent_distribution
            .entry(intent.to_string())
            .or_insert(0) += 1;
    }

    pub fn record_template(&mut self, template_name: &str) {
        *self
            .template_usage
            .entry(template_name.to_string())
            .or_insert(0) += 1;
    }

    pub fn record_latency(&mut self, latency_ms: f64) {
        self.rank_latencies_ms.push(latency_ms);
    }

    /// Most used templates, by count descending then name.
    pub fn most_used_templates(&self, limit: usize) -> Vec<(String, u64)> {
        let mut sorted: Vec<_> = self
            .template_usage
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        sorted.truncate(limit);
        sorted
    }

    pub fn avg_latency_ms(&self) -> f64 {
        if self.rank_latencies_ms.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.rank_latencies_ms.iter().sum();
        sum / self.rank_latencies_ms.len() as f64
    }
}
