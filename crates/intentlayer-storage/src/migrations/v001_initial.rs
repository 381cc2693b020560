//! v001: user_profiles, sessions, interactions, global_stats.

pub const MIGRATION_SQL: &str = "
CREATE TABLE IF NOT EXISTS user_profiles (
    user_id          TEXT PRIMARY KEY,
    preferences      TEXT NOT NULL DEFAULT '{}',
    context_summary  TEXT NOT NULL DEFAULT '',
    activity_level   REAL NOT NULL DEFAULT 0.5,
    category_usage   TEXT NOT NULL DEFAULT '{}',
    created_at       TEXT NOT NULL,
    last_active      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    session_id         TEXT PRIMARY KEY,
    user_id            TEXT NOT NULL,
    created_at         TEXT NOT NULL,
    last_activity      TEXT NOT NULL,
    interaction_count  INTEGER NOT NULL DEFAULT 0,
    is_active          INTEGER NOT NULL DEFAULT 1,
    window_capacity    INTEGER NOT NULL,
    window             TEXT NOT NULL DEFAULT '[]',
    user_data          TEXT NOT NULL DEFAULT '{}',
    context            TEXT NOT NULL DEFAULT '{}',
    FOREIGN KEY (user_id) REFERENCES user_profiles(user_id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS interactions (
    id               TEXT PRIMARY KEY,
    user_id          TEXT NOT NULL,
    session_id       TEXT NOT NULL,
    timestamp        TEXT NOT NULL,
    user_input       TEXT NOT NULL DEFAULT '',
    intent           TEXT NOT NULL,
    entities         TEXT NOT NULL DEFAULT '{}',
    context          TEXT NOT NULL DEFAULT '{}',
    ui_generated     TEXT NOT NULL DEFAULT '{}',
    relevance_score  REAL NOT NULL DEFAULT 0.0,
    FOREIGN KEY (user_id) REFERENCES user_profiles(user_id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS global_stats (
    id          INTEGER PRIMARY KEY CHECK (id = 1),
    snapshot    TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);
";
