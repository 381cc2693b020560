//! global_stats singleton row.

use rusqlite::{params, Connection, OptionalExtension};

use intentlayer_core::errors::IntentLayerResult;
use intentlayer_core::models::GlobalStatsSnapshot;

use super::{fmt_ts, from_json, to_json};
use crate::to_storage_err;

pub fn save_snapshot(conn: &Connection, snapshot: &GlobalStatsSnapshot) -> IntentLayerResult<()> {
    conn.execute(
        "INSERT INTO global_stats (id, snapshot, updated_at) VALUES (1, ?1, ?2)
         ON CONFLICT(id) DO UPDATE SET snapshot = excluded.snapshot, updated_at = excluded.updated_at",
        params![to_json(snapshot)?, fmt_ts(&snapshot.last_updated)],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn load_snapshot(conn: &Connection) -> IntentLayerResult<Option<GlobalStatsSnapshot>> {
    let raw: Option<String> = conn
        .query_row("SELECT snapshot FROM global_stats WHERE id = 1", [], |row| row.get(0))
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    raw.map(|raw| from_json(&raw)).transpose()
}
