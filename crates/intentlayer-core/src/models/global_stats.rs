use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time copy of the process-wide aggregate statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalStatsSnapshot {
    pub total_users: u64,
    pub total_sessions: u64,
    pub total_interactions: u64,
    /// Intent → count.
    pub intent_counts: BTreeMap<String, u64>,
    /// Category → count.
    pub category_counts: BTreeMap<String, u64>,
    /// Top-K intents by frequency, descending.
    pub most_common_intents: Vec<(String, u64)>,
    /// Top-K categories by frequency, descending.
    pub most_active_categories: Vec<(String, u64)>,
    /// Average completed turns per session.
    pub average_session_length: f64,
    pub last_updated: DateTime<Utc>,
}

impl Default for GlobalStatsSnapshot {
    fn default() -> Self {
        Self {
            total_users: 0,
            total_sessions: 0,
            total_interactions: 0,
            intent_counts: BTreeMap::new(),
            category_counts: BTreeMap::new(),
            most_common_intents: Vec::new(),
            most_active_categories: Vec::new(),
            average_session_length: 0.0,
            last_updated: Utc::now(),
        }
    }
}
