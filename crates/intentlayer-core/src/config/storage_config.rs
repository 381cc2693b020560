use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Persistence configuration. `path: None` runs without durability.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: Option<PathBuf>,
    /// Interval between global stats flushes (seconds).
    pub stats_flush_interval_secs: u64,
    /// Entries in the fallback UI cache.
    pub fallback_cache_capacity: u64,
    /// Age after which a cached fallback UI is no longer served (seconds).
    pub fallback_cache_ttl_secs: u64,
}

impl StorageConfig {
    pub fn fallback_cache_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.fallback_cache_ttl_secs)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            stats_flush_interval_secs: defaults::DEFAULT_STATS_FLUSH_INTERVAL_SECS,
            fallback_cache_capacity: defaults::DEFAULT_FALLBACK_CACHE_CAPACITY,
            fallback_cache_ttl_secs: defaults::DEFAULT_FALLBACK_CACHE_TTL_SECS,
        }
    }
}

/// Template catalog location. `path: None` loads the built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub path: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    pub log_level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: defaults::DEFAULT_LOG_LEVEL.to_string(),
            json: false,
        }
    }
}
