//! StorageEngine: owns the connection, runs migrations, implements IPersistence.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use intentlayer_core::errors::{IntentLayerResult, StorageError};
use intentlayer_core::models::{GlobalStatsSnapshot, Interaction, PersistedUser, Session, UserProfile};
use intentlayer_core::traits::IPersistence;

use crate::pool::{pragmas, WriteConnection};
use crate::queries::{interaction_ops, profile_ops, session_ops, stats_ops};
use crate::{migrations, to_storage_err};

/// SQLite-backed persistence. Every trait method runs in one transaction.
pub struct StorageEngine {
    conn: WriteConnection,
    db_path: Option<PathBuf>,
}

impl StorageEngine {
    /// Open (creating if needed) a database file and bring its schema up to date.
    pub fn open(path: &Path) -> IntentLayerResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                to_storage_err(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        let engine = Self {
            conn: WriteConnection::open(path)?,
            db_path: Some(path.to_path_buf()),
        };
        engine.initialize()?;
        Ok(engine)
    }

    /// In-memory database for tests and non-durable runs.
    pub fn open_in_memory() -> IntentLayerResult<Self> {
        let engine = Self {
            conn: WriteConnection::open_in_memory()?,
            db_path: None,
        };
        engine.initialize()?;
        Ok(engine)
    }

    fn initialize(&self) -> IntentLayerResult<()> {
        self.conn.with_conn(|conn| {
            let applied = migrations::run_migrations(conn)?;
            if applied > 0 {
                tracing::info!(applied, path = ?self.db_path, "storage schema migrated");
            }
            Ok(())
        })
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    pub fn schema_version(&self) -> IntentLayerResult<u32> {
        self.conn.with_conn(|conn| migrations::current_version(conn))
    }

    /// True when the file-backed database runs in WAL mode. In-memory databases never do.
    pub fn is_wal(&self) -> IntentLayerResult<bool> {
        self.conn.with_conn(|conn| pragmas::verify_wal_mode(conn))
    }

    /// Run `PRAGMA integrity_check`.
    pub fn integrity_check(&self) -> IntentLayerResult<()> {
        self.conn.with_conn(|conn| {
            let result: String = conn
                .query_row("PRAGMA integrity_check", [], |row| row.get(0))
                .map_err(|e| to_storage_err(e.to_string()))?;
            if result == "ok" {
                Ok(())
            } else {
                Err(StorageError::CorruptionDetected { details: result }.into())
            }
        })
    }

    /// Total stored interactions across all users.
    pub fn interaction_count(&self) -> IntentLayerResult<u64> {
        self.conn.with_conn(|conn| interaction_ops::count_interactions(conn))
    }

    /// Run `f` inside a transaction, rolling back on any error.
    fn in_transaction<F, T>(&self, f: F) -> IntentLayerResult<T>
    where
        F: FnOnce(&Connection) -> IntentLayerResult<T>,
    {
        self.conn.with_conn(|conn| {
            let tx = conn.transaction().map_err(|e| to_storage_err(e.to_string()))?;
            let value = f(&*tx)?;
            tx.commit().map_err(|e| to_storage_err(e.to_string()))?;
            Ok(value)
        })
    }
}

impl IPersistence for StorageEngine {
    fn commit_turn(
        &self,
        session: &Session,
        profile: &UserProfile,
        interaction: &Interaction,
    ) -> IntentLayerResult<()> {
        self.in_transaction(|conn| {
            profile_ops::upsert_profile(conn, profile)?;
            session_ops::upsert_session(conn, session)?;
            interaction_ops::insert_interaction(conn, interaction)
        })
    }

    fn commit_append(&self, session: &Session, interaction: &Interaction) -> IntentLayerResult<()> {
        self.in_transaction(|conn| {
            profile_ops::touch_profile(conn, &session.user_id, &interaction.timestamp)?;
            session_ops::upsert_session(conn, session)?;
            interaction_ops::insert_interaction(conn, interaction)
        })
    }

    fn commit_new_session(
        &self,
        session: &Session,
        profile: &UserProfile,
        evicted: &[String],
    ) -> IntentLayerResult<()> {
        self.in_transaction(|conn| {
            profile_ops::upsert_profile(conn, profile)?;
            for session_id in evicted {
                session_ops::delete_session(conn, session_id)?;
            }
            session_ops::upsert_session(conn, session)
        })
    }

    fn save_session(&self, session: &Session) -> IntentLayerResult<()> {
        self.in_transaction(|conn| session_ops::upsert_session(conn, session))
    }

    fn delete_session(&self, session_id: &str) -> IntentLayerResult<bool> {
        self.in_transaction(|conn| session_ops::delete_session(conn, session_id))
    }

    fn load_sessions(&self) -> IntentLayerResult<Vec<Session>> {
        self.conn.with_conn(|conn| session_ops::load_sessions(conn))
    }

    fn save_profile(&self, profile: &UserProfile) -> IntentLayerResult<()> {
        self.in_transaction(|conn| profile_ops::upsert_profile(conn, profile))
    }

    fn delete_user(&self, user_id: &str) -> IntentLayerResult<bool> {
        self.in_transaction(|conn| profile_ops::delete_profile(conn, user_id))
    }

    fn load_users(&self, history_limit: usize) -> IntentLayerResult<Vec<PersistedUser>> {
        self.conn.with_conn(|conn| {
            let profiles = profile_ops::load_profiles(conn)?;
            let mut users = Vec::with_capacity(profiles.len());
            for profile in profiles {
                let interactions = interaction_ops::recent_for_user(conn, &profile.user_id, history_limit)?;
                users.push(PersistedUser {
                    profile,
                    interactions,
                });
            }
            Ok(users)
        })
    }

    fn prune_interactions(&self, before: DateTime<Utc>) -> IntentLayerResult<usize> {
        self.in_transaction(|conn| interaction_ops::prune_before(conn, before))
    }

    fn save_global_stats(&self, stats: &GlobalStatsSnapshot) -> IntentLayerResult<()> {
        self.in_transaction(|conn| stats_ops::save_snapshot(conn, stats))
    }

    fn load_global_stats(&self) -> IntentLayerResult<Option<GlobalStatsSnapshot>> {
        self.conn.with_conn(|conn| stats_ops::load_snapshot(conn))
    }
}
