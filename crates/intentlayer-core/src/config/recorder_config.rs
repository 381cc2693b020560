use serde::{Deserialize, Serialize};

use super::defaults;

/// Interaction recorder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Maximum length of a profile's context summary (characters).
    pub summary_max_chars: usize,
    /// Relevance at or above which a turn counts as a successful category use.
    pub success_threshold: f64,
    /// Half-life of the activity level (days).
    pub activity_half_life_days: f64,
    /// Activity added per recorded turn.
    pub activity_increment: f64,
    /// Entries in the top intent / category lists of global stats.
    pub stats_top_k: usize,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            summary_max_chars: defaults::DEFAULT_SUMMARY_MAX_CHARS,
            success_threshold: defaults::DEFAULT_SUCCESS_THRESHOLD,
            activity_half_life_days: defaults::DEFAULT_ACTIVITY_HALF_LIFE_DAYS,
            activity_increment: defaults::DEFAULT_ACTIVITY_INCREMENT,
            stats_top_k: defaults::DEFAULT_STATS_TOP_K,
        }
    }
}
