use chrono::{DateTime, Utc};

use crate::errors::IntentLayerResult;
use crate::models::{GlobalStatsSnapshot, Interaction, PersistedUser, Session, UserProfile};

/// Durability for sessions, profiles, interactions and global statistics.
///
/// Keyed by `user_id` / `session_id`. Every method is all-or-nothing.
pub trait IPersistence: Send + Sync {
    // --- Turn ---
    /// Write the session, profile and new interaction of one turn atomically.
    fn commit_turn(
        &self,
        session: &Session,
        profile: &UserProfile,
        interaction: &Interaction,
    ) -> IntentLayerResult<()>;
    /// Write the session and a new interaction atomically. The owner's
    /// `last_active` only moves forward; the rest of the profile is untouched.
    fn commit_append(&self, session: &Session, interaction: &Interaction) -> IntentLayerResult<()>;

    // --- Sessions ---
    /// Write a new session and its owner's profile, and delete the sessions
    /// evicted to make room for it, atomically.
    fn commit_new_session(
        &self,
        session: &Session,
        profile: &UserProfile,
        evicted: &[String],
    ) -> IntentLayerResult<()>;
    fn save_session(&self, session: &Session) -> IntentLayerResult<()>;
    fn delete_session(&self, session_id: &str) -> IntentLayerResult<bool>;
    fn load_sessions(&self) -> IntentLayerResult<Vec<Session>>;

    // --- Users ---
    fn save_profile(&self, profile: &UserProfile) -> IntentLayerResult<()>;
    /// Remove the profile, its interactions and its sessions.
    fn delete_user(&self, user_id: &str) -> IntentLayerResult<bool>;
    /// Every profile with up to `history_limit` most recent interactions, oldest first.
    fn load_users(&self, history_limit: usize) -> IntentLayerResult<Vec<PersistedUser>>;

    // --- Maintenance ---
    /// Drop interactions older than `before`. Returns the number removed.
    fn prune_interactions(&self, before: DateTime<Utc>) -> IntentLayerResult<usize>;

    // --- Global stats ---
    fn save_global_stats(&self, stats: &GlobalStatsSnapshot) -> IntentLayerResult<()>;
    fn load_global_stats(&self) -> IntentLayerResult<Option<GlobalStatsSnapshot>>;
}
