//! Default values for every configuration knob.

// Session store
pub const DEFAULT_WINDOW_CAPACITY: usize = 10;
pub const DEFAULT_MAX_SESSIONS_PER_USER: usize = 5;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 3600;
pub const DEFAULT_MAINTENANCE_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_MAX_HISTORY_PER_USER: usize = 1000;
pub const DEFAULT_HISTORY_RETENTION_DAYS: u64 = 30;
pub const DEFAULT_INACTIVE_PURGE_SECS: u64 = 86_400;

// Ranking
pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_HISTORY_TURNS: usize = 3;
pub const DEFAULT_SEARCH_LIMIT: usize = 20;
pub const DEFAULT_RANK_DEADLINE_MS: u64 = 2000;
pub const DEFAULT_RECENCY_HALF_LIFE_HOURS: f64 = 24.0;
pub const DEFAULT_WEIGHT_SIMILARITY: f64 = 0.5;
pub const DEFAULT_WEIGHT_TAG_OVERLAP: f64 = 0.25;
pub const DEFAULT_WEIGHT_PREFERENCE: f64 = 0.15;
pub const DEFAULT_WEIGHT_RECENCY: f64 = 0.10;

// Recorder
pub const DEFAULT_SUMMARY_MAX_CHARS: usize = 512;
pub const DEFAULT_SUCCESS_THRESHOLD: f64 = 0.5;
pub const DEFAULT_ACTIVITY_HALF_LIFE_DAYS: f64 = 7.0;
pub const DEFAULT_ACTIVITY_INCREMENT: f64 = 0.1;
pub const DEFAULT_ACTIVITY_LEVEL: f64 = 0.0;
pub const DEFAULT_STATS_TOP_K: usize = 5;

// Engine / storage
pub const DEFAULT_STATS_FLUSH_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_FALLBACK_CACHE_CAPACITY: u64 = 256;
pub const DEFAULT_FALLBACK_CACHE_TTL_SECS: u64 = 3_600;

// Observability
pub const DEFAULT_LOG_LEVEL: &str = "info";
