//! user_profiles table.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use intentlayer_core::errors::IntentLayerResult;
use intentlayer_core::models::UserProfile;

use super::{fmt_ts, from_json, parse_ts, to_json};
use crate::to_storage_err;

/// Insert or update a profile in place. Never deletes the row, so
/// dependent sessions and interactions survive. `last_active` never moves
/// backwards.
pub fn upsert_profile(conn: &Connection, profile: &UserProfile) -> IntentLayerResult<()> {
    conn.execute(
        "INSERT INTO user_profiles
            (user_id, preferences, context_summary, activity_level, category_usage, created_at, last_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(user_id) DO UPDATE SET
            preferences = excluded.preferences,
            context_summary = excluded.context_summary,
            activity_level = excluded.activity_level,
            category_usage = excluded.category_usage,
            last_active = MAX(user_profiles.last_active, excluded.last_active)",
        params![
            profile.user_id,
            to_json(&profile.preferences)?,
            profile.context_summary,
            profile.activity_level,
            to_json(&profile.category_usage)?,
            fmt_ts(&profile.created_at),
            fmt_ts(&profile.last_active),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Advance `last_active` to `at` if it is later. Returns false for unknown users.
pub fn touch_profile(conn: &Connection, user_id: &str, at: &DateTime<Utc>) -> IntentLayerResult<bool> {
    let updated = conn
        .execute(
            "UPDATE user_profiles SET last_active = MAX(last_active, ?2) WHERE user_id = ?1",
            params![user_id, fmt_ts(at)],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(updated > 0)
}

/// Delete a profile. Sessions and interactions cascade. Returns true if it existed.
pub fn delete_profile(conn: &Connection, user_id: &str) -> IntentLayerResult<bool> {
    let removed = conn
        .execute("DELETE FROM user_profiles WHERE user_id = ?1", params![user_id])
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(removed > 0)
}

pub fn load_profiles(conn: &Connection) -> IntentLayerResult<Vec<UserProfile>> {
    let mut stmt = conn
        .prepare(
            "SELECT user_id, preferences, context_summary, activity_level, category_usage,
                    created_at, last_active
             FROM user_profiles ORDER BY user_id",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut profiles = Vec::new();
    for row in rows {
        let (user_id, preferences, context_summary, activity_level, category_usage, created_at, last_active) =
            row.map_err(|e| to_storage_err(e.to_string()))?;
        profiles.push(UserProfile {
            user_id,
            preferences: from_json(&preferences)?,
            context_summary,
            activity_level,
            created_at: parse_ts(&created_at)?,
            last_active: parse_ts(&last_active)?,
            category_usage: from_json(&category_usage)?,
        });
    }
    Ok(profiles)
}
