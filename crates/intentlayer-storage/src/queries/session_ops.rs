//! sessions table. The window and maps are stored as JSON text.

use rusqlite::{params, Connection};

use intentlayer_core::errors::IntentLayerResult;
use intentlayer_core::models::Session;

use super::{fmt_ts, from_json, parse_ts, to_json};
use crate::to_storage_err;

pub fn upsert_session(conn: &Connection, session: &Session) -> IntentLayerResult<()> {
    conn.execute(
        "INSERT INTO sessions
            (session_id, user_id, created_at, last_activity, interaction_count, is_active,
             window_capacity, window, user_data, context)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         ON CONFLICT(session_id) DO UPDATE SET
            last_activity = excluded.last_activity,
            interaction_count = excluded.interaction_count,
            is_active = excluded.is_active,
            window_capacity = excluded.window_capacity,
            window = excluded.window,
            user_data = excluded.user_data,
            context = excluded.context",
        params![
            session.session_id,
            session.user_id,
            fmt_ts(&session.created_at),
            fmt_ts(&session.last_activity),
            session.interaction_count as i64,
            session.is_active,
            session.window_capacity as i64,
            to_json(&session.window)?,
            to_json(&session.user_data)?,
            to_json(&session.context)?,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Returns true if the session existed.
pub fn delete_session(conn: &Connection, session_id: &str) -> IntentLayerResult<bool> {
    let removed = conn
        .execute("DELETE FROM sessions WHERE session_id = ?1", params![session_id])
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(removed > 0)
}

pub fn load_sessions(conn: &Connection) -> IntentLayerResult<Vec<Session>> {
    let mut stmt = conn
        .prepare(
            "SELECT session_id, user_id, created_at, last_activity, interaction_count, is_active,
                    window_capacity, window, user_data, context
             FROM sessions ORDER BY created_at, session_id",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| {
            Ok(RawSession {
                session_id: row.get(0)?,
                user_id: row.get(1)?,
                created_at: row.get(2)?,
                last_activity: row.get(3)?,
                interaction_count: row.get(4)?,
                is_active: row.get(5)?,
                window_capacity: row.get(6)?,
                window: row.get(7)?,
                user_data: row.get(8)?,
                context: row.get(9)?,
            })
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut sessions = Vec::new();
    for row in rows {
        let raw = row.map_err(|e| to_storage_err(e.to_string()))?;
        sessions.push(raw.into_session()?);
    }
    Ok(sessions)
}

struct RawSession {
    session_id: String,
    user_id: String,
    created_at: String,
    last_activity: String,
    interaction_count: i64,
    is_active: bool,
    window_capacity: i64,
    window: String,
    user_data: String,
    context: String,
}

impl RawSession {
    fn into_session(self) -> IntentLayerResult<Session> {
        Ok(Session {
            session_id: self.session_id,
            user_id: self.user_id,
            created_at: parse_ts(&self.created_at)?,
            last_activity: parse_ts(&self.last_activity)?,
            interaction_count: self.interaction_count.max(0) as u64,
            is_active: self.is_active,
            window: from_json(&self.window)?,
            window_capacity: self.window_capacity.max(1) as usize,
            user_data: from_json(&self.user_data)?,
            context: from_json(&self.context)?,
        })
    }
}
