//! Configuration for every IntentLayer subsystem.
//!
//! # Examples
//!
//! ```
//! use intentlayer_core::config::IntentLayerConfig;
//!
//! let config = IntentLayerConfig::from_toml_str(
//!     r#"
//!     [session]
//!     window_capacity = 4
//!
//!     [ranking.weights]
//!     similarity = 0.4
//!     tag_overlap = 0.3
//!     preference_affinity = 0.2
//!     recency = 0.1
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.session.window_capacity, 4);
//! assert_eq!(config.ranking.top_k, 5);
//! ```

mod composer_config;
pub mod defaults;
mod ranking_config;
mod recorder_config;
mod session_config;
mod storage_config;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{IntentLayerError, IntentLayerResult};

pub use composer_config::ComposerConfig;
pub use ranking_config::{RankingConfig, RankingWeights};
pub use recorder_config::RecorderConfig;
pub use session_config::SessionConfig;
pub use storage_config::{CatalogConfig, ObservabilityConfig, StorageConfig};

/// Top-level configuration aggregating all subsystem configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentLayerConfig {
    pub session: SessionConfig,
    pub ranking: RankingConfig,
    pub composer: ComposerConfig,
    pub recorder: RecorderConfig,
    pub catalog: CatalogConfig,
    pub storage: StorageConfig,
    pub observability: ObservabilityConfig,
}

impl IntentLayerConfig {
    /// Parse and validate a TOML document. Missing sections take their defaults.
    pub fn from_toml_str(toml_str: &str) -> IntentLayerResult<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| IntentLayerError::ConfigError {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> IntentLayerResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| IntentLayerError::ConfigError {
            reason: format!("failed to read {}: {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> IntentLayerResult<()> {
        self.ranking.weights.validate()?;
        let checks = [
            (self.session.window_capacity == 0, "session.window_capacity must be > 0"),
            (
                self.session.max_sessions_per_user == 0,
                "session.max_sessions_per_user must be > 0",
            ),
            (self.ranking.top_k == 0, "ranking.top_k must be > 0"),
            (self.ranking.deadline_ms == 0, "ranking.deadline_ms must be > 0"),
            (
                self.storage.fallback_cache_ttl_secs == 0,
                "storage.fallback_cache_ttl_secs must be > 0",
            ),
            (
                self.ranking.recency_half_life_hours <= 0.0,
                "ranking.recency_half_life_hours must be > 0",
            ),
            (
                self.recorder.activity_half_life_days <= 0.0,
                "recorder.activity_half_life_days must be > 0",
            ),
        ];
        for (failed, reason) in checks {
            if failed {
                return Err(IntentLayerError::ConfigError {
                    reason: reason.to_string(),
                });
            }
        }
        Ok(())
    }
}
