//! Versioned schema migrations tracked through `PRAGMA user_version`.

mod v001_initial;
mod v002_indexes;

use rusqlite::Connection;

use intentlayer_core::errors::{IntentLayerResult, StorageError};

/// Highest schema version this build knows how to create.
pub const LATEST_VERSION: u32 = 2;

const MIGRATIONS: &[(u32, &str)] = &[
    (1, v001_initial::MIGRATION_SQL),
    (2, v002_indexes::MIGRATION_SQL),
];

/// Current `user_version` of the database.
pub fn current_version(conn: &Connection) -> IntentLayerResult<u32> {
    let version: u32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| StorageError::MigrationFailed {
            version: 0,
            reason: e.to_string(),
        })?;
    Ok(version)
}

/// Apply every migration newer than the stored version, each in its own transaction.
/// Returns the number applied.
pub fn run_migrations(conn: &mut Connection) -> IntentLayerResult<usize> {
    let current = current_version(conn)?;
    if current > LATEST_VERSION {
        return Err(StorageError::MigrationFailed {
            version: current,
            reason: format!("database schema is newer than supported version {LATEST_VERSION}"),
        }
        .into());
    }

    let mut applied = 0;
    for &(version, sql) in MIGRATIONS {
        if version <= current {
            continue;
        }
        let failed = |e: rusqlite::Error| StorageError::MigrationFailed {
            version,
            reason: e.to_string(),
        };
        let tx = conn.transaction().map_err(failed)?;
        tx.execute_batch(sql).map_err(failed)?;
        tx.pragma_update(None, "user_version", version).map_err(failed)?;
        tx.commit().map_err(failed)?;
        tracing::debug!(version, "applied schema migration");
        applied += 1;
    }
    Ok(applied)
}
