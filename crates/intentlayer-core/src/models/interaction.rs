use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ValueMap;

/// Compact reference to the UI composed for a turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiSummary {
    /// Template names of the composed components, in output order.
    pub components: Vec<String>,
    pub layout: Option<String>,
    /// Categories of the composed components, deduplicated.
    pub categories: Vec<String>,
}

/// One completed turn. Immutable once built; belongs to exactly one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    pub user_id: String,
    pub user_input: String,
    pub intent: String,
    pub entities: BTreeMap<String, String>,
    pub context: ValueMap,
    pub ui_generated: UiSummary,
    /// Relevance of the turn, clamped to [0.0, 1.0].
    pub relevance_score: f64,
}
