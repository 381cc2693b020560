//! PRAGMA configuration applied to every SQLite connection.
//!
//! WAL mode, NORMAL sync, 32MB cache, 5s busy_timeout, foreign_keys ON.

use rusqlite::Connection;

use intentlayer_core::errors::IntentLayerResult;

use crate::to_storage_err;

/// Apply performance and integrity pragmas to a connection.
pub fn apply_pragmas(conn: &Connection) -> IntentLayerResult<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA cache_size = -32000;
        PRAGMA busy_timeout = 5000;
        PRAGMA foreign_keys = ON;
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// True when the connection runs in WAL journal mode.
pub fn verify_wal_mode(conn: &Connection) -> IntentLayerResult<bool> {
    let mode: String = conn
        .pragma_query_value(None, "journal_mode", |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(mode.eq_ignore_ascii_case("wal"))
}
