use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Interaction, ValueMap};
use crate::config::defaults::DEFAULT_ACTIVITY_LEVEL;

/// Per-user profile. Created lazily on the user's first session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    /// Open-ended preferences, validated at the boundary only.
    #[serde(default)]
    pub preferences: ValueMap,
    /// Bounded rolling summary of recent intents and entities.
    #[serde(default)]
    pub context_summary: String,
    /// Activity in [0.0, 1.0], decaying over time.
    pub activity_level: f64,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    /// Category → last time a component of it was used successfully.
    #[serde(default)]
    pub category_usage: BTreeMap<String, DateTime<Utc>>,
}

impl UserProfile {
    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            preferences: ValueMap::new(),
            context_summary: String::new(),
            activity_level: DEFAULT_ACTIVITY_LEVEL,
            created_at: now,
            last_active: now,
            category_usage: BTreeMap::new(),
        }
    }

    /// Merge `incoming` into the preferences. Incoming keys win; other keys are kept.
    pub fn merge_preferences(&mut self, incoming: &ValueMap) {
        for (key, value) in incoming {
            self.preferences.insert(key.clone(), value.clone());
        }
    }

    /// Activity level decayed with `half_life_days` from `last_active` to `now`.
    pub fn decayed_activity(&self, now: DateTime<Utc>, half_life_days: f64) -> f64 {
        let elapsed_days = (now - self.last_active).num_seconds().max(0) as f64 / 86_400.0;
        let factor = 0.5_f64.powf(elapsed_days / half_life_days);
        (self.activity_level * factor).clamp(0.0, 1.0)
    }
}

/// A profile together with its durable interaction log, as restored at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedUser {
    pub profile: UserProfile,
    /// Oldest first.
    pub interactions: Vec<Interaction>,
}
