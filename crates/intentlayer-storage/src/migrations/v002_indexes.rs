//! v002: lookup indexes for per-user history and pruning.

pub const MIGRATION_SQL: &str = "
CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);
CREATE INDEX IF NOT EXISTS idx_interactions_user_time ON interactions(user_id, timestamp);
CREATE INDEX IF NOT EXISTS idx_interactions_time ON interactions(timestamp);
";
