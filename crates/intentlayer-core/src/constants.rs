/// IntentLayer version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lower bound of every slot rectangle axis, in percentage units.
pub const LAYOUT_AXIS_MIN: f64 = 0.0;

/// Upper bound of every slot rectangle axis, in percentage units.
pub const LAYOUT_AXIS_MAX: f64 = 100.0;

/// Tolerance used when checking that ranking weights sum to one.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Separator between clauses of a profile's context summary.
pub const SUMMARY_CLAUSE_SEPARATOR: &str = "; ";

/// Window used to classify a user as recently active (days).
pub const ACTIVE_USER_WINDOW_DAYS: i64 = 7;

/// Key of the singleton global stats row in persistence.
pub const GLOBAL_STATS_KEY: &str = "global";
