//! interactions table, the durable per-user history.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use intentlayer_core::errors::IntentLayerResult;
use intentlayer_core::models::Interaction;

use super::{fmt_ts, from_json, parse_ts, to_json};
use crate::to_storage_err;

pub fn insert_interaction(conn: &Connection, interaction: &Interaction) -> IntentLayerResult<()> {
    conn.execute(
        "INSERT INTO interactions
            (id, user_id, session_id, timestamp, user_input, intent, entities, context,
             ui_generated, relevance_score)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            interaction.id,
            interaction.user_id,
            interaction.session_id,
            fmt_ts(&interaction.timestamp),
            interaction.user_input,
            interaction.intent,
            to_json(&interaction.entities)?,
            to_json(&interaction.context)?,
            to_json(&interaction.ui_generated)?,
            interaction.relevance_score,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Up to `limit` most recent interactions of a user, oldest first.
pub fn recent_for_user(conn: &Connection, user_id: &str, limit: usize) -> IntentLayerResult<Vec<Interaction>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, user_id, session_id, timestamp, user_input, intent, entities, context,
                    ui_generated, relevance_score
             FROM interactions
             WHERE user_id = ?1
             ORDER BY timestamp DESC, id DESC
             LIMIT ?2",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![user_id, limit as i64], |row| {
            Ok(RawInteraction {
                id: row.get(0)?,
                user_id: row.get(1)?,
                session_id: row.get(2)?,
                timestamp: row.get(3)?,
                user_input: row.get(4)?,
                intent: row.get(5)?,
                entities: row.get(6)?,
                context: row.get(7)?,
                ui_generated: row.get(8)?,
                relevance_score: row.get(9)?,
            })
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut interactions = Vec::new();
    for row in rows {
        let raw = row.map_err(|e| to_storage_err(e.to_string()))?;
        interactions.push(raw.into_interaction()?);
    }
    interactions.reverse();
    Ok(interactions)
}

/// Delete interactions strictly older than `before`. Returns the count deleted.
pub fn prune_before(conn: &Connection, before: DateTime<Utc>) -> IntentLayerResult<usize> {
    conn.execute(
        "DELETE FROM interactions WHERE timestamp < ?1",
        params![fmt_ts(&before)],
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

pub fn count_interactions(conn: &Connection) -> IntentLayerResult<u64> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM interactions", [], |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(count.max(0) as u64)
}

struct RawInteraction {
    id: String,
    user_id: String,
    session_id: String,
    timestamp: String,
    user_input: String,
    intent: String,
    entities: String,
    context: String,
    ui_generated: String,
    relevance_score: f64,
}

impl RawInteraction {
    fn into_interaction(self) -> IntentLayerResult<Interaction> {
        Ok(Interaction {
            id: self.id,
            timestamp: parse_ts(&self.timestamp)?,
            session_id: self.session_id,
            user_id: self.user_id,
            user_input: self.user_input,
            intent: self.intent,
            entities: from_json(&self.entities)?,
            context: from_json(&self.context)?,
            ui_generated: from_json(&self.ui_generated)?,
            relevance_score: self.relevance_score,
        })
    }
}
