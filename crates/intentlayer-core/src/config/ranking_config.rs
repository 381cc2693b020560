use serde::{Deserialize, Serialize};

use super::defaults;
use crate::constants::WEIGHT_SUM_TOLERANCE;
use crate::errors::{IntentLayerError, IntentLayerResult};

/// Weights of the four composite-score terms. Must be non-negative and sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingWeights {
    pub similarity: f64,
    pub tag_overlap: f64,
    pub preference_affinity: f64,
    pub recency: f64,
}

impl RankingWeights {
    pub fn sum(&self) -> f64 {
        self.similarity + self.tag_overlap + self.preference_affinity + self.recency
    }

    pub fn validate(&self) -> IntentLayerResult<()> {
        let all = [
            self.similarity,
            self.tag_overlap,
            self.preference_affinity,
            self.recency,
        ];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(IntentLayerError::ConfigError {
                reason: format!("ranking weights must be finite and non-negative: {self:?}"),
            });
        }
        if (self.sum() - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(IntentLayerError::ConfigError {
                reason: format!("ranking weights must sum to 1, got {}", self.sum()),
            });
        }
        Ok(())
    }
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            similarity: defaults::DEFAULT_WEIGHT_SIMILARITY,
            tag_overlap: defaults::DEFAULT_WEIGHT_TAG_OVERLAP,
            preference_affinity: defaults::DEFAULT_WEIGHT_PREFERENCE,
            recency: defaults::DEFAULT_WEIGHT_RECENCY,
        }
    }
}

/// Relevance ranker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub weights: RankingWeights,
    /// Maximum candidates returned by a rank call.
    pub top_k: usize,
    /// Recent user inputs folded into the query (k).
    pub history_turns: usize,
    /// Maximum hits requested from the knowledge index.
    pub search_limit: usize,
    /// Deadline for a whole rank call (milliseconds).
    pub deadline_ms: u64,
    /// Half-life of the category recency boost (hours).
    pub recency_half_life_hours: f64,
}

impl RankingConfig {
    pub fn deadline(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.deadline_ms)
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            weights: RankingWeights::default(),
            top_k: defaults::DEFAULT_TOP_K,
            history_turns: defaults::DEFAULT_HISTORY_TURNS,
            search_limit: defaults::DEFAULT_SEARCH_LIMIT,
            deadline_ms: defaults::DEFAULT_RANK_DEADLINE_MS,
            recency_half_life_hours: defaults::DEFAULT_RECENCY_HALF_LIFE_HOURS,
        }
    }
}
