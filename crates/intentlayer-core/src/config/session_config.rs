use serde::{Deserialize, Serialize};

use super::defaults;

/// Session store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Capacity N of each session's short-term window.
    pub window_capacity: usize,
    /// Sessions kept per user before the least-recently-active one is evicted.
    pub max_sessions_per_user: usize,
    /// Idle time after which a session is marked inactive (seconds).
    pub idle_timeout_secs: u64,
    /// Interval between background maintenance cycles (seconds).
    pub maintenance_interval_secs: u64,
    /// Interactions kept in each user's history.
    pub max_history_per_user: usize,
    /// History entries older than this are pruned (days).
    pub history_retention_days: u64,
    /// Inactive sessions idle for longer than this are hard-removed (seconds).
    pub inactive_purge_secs: u64,
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.idle_timeout_secs as i64)
    }

    pub fn inactive_purge_after(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.inactive_purge_secs as i64)
    }

    pub fn history_retention(&self) -> chrono::Duration {
        chrono::Duration::days(self.history_retention_days as i64)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            window_capacity: defaults::DEFAULT_WINDOW_CAPACITY,
            max_sessions_per_user: defaults::DEFAULT_MAX_SESSIONS_PER_USER,
            idle_timeout_secs: defaults::DEFAULT_IDLE_TIMEOUT_SECS,
            maintenance_interval_secs: defaults::DEFAULT_MAINTENANCE_INTERVAL_SECS,
            max_history_per_user: defaults::DEFAULT_MAX_HISTORY_PER_USER,
            history_retention_days: defaults::DEFAULT_HISTORY_RETENTION_DAYS,
            inactive_purge_secs: defaults::DEFAULT_INACTIVE_PURGE_SECS,
        }
    }
}
