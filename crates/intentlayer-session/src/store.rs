//! SessionStore: concurrent per-session and per-user state via DashMap.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use intentlayer_core::config::SessionConfig;
use intentlayer_core::errors::{IntentLayerError, IntentLayerResult};
use intentlayer_core::models::{Interaction, PersistedUser, Session, UserProfile, ValueMap};
use intentlayer_core::traits::IPersistence;
use intentlayer_observability::session_span;

use crate::analytics::SessionAnalytics;
use crate::memory::{search_score, HistoryMatch, MemoryStats};
use crate::user_record::{history_rank, UserRecord};

pub(crate) struct SessionSlot {
    pub user_id: String,
    pub state: Mutex<Session>,
}

/// Result of [`SessionStore::create_session`].
#[derive(Debug, Clone)]
pub struct SessionCreated {
    pub session: Session,
    pub profile: UserProfile,
    /// Sessions removed to keep the user under the session cap.
    pub evicted: Vec<String>,
    /// Whether the profile was created by this call.
    pub new_user: bool,
}

/// Thread-safe owner of every session and user profile.
///
/// Writes go to the persistence collaborator first and are applied in memory
/// only once it succeeds, so a failed write leaves no trace.
pub struct SessionStore {
    config: SessionConfig,
    pub(crate) sessions: DashMap<String, Arc<SessionSlot>>,
    pub(crate) users: DashMap<String, Arc<Mutex<UserRecord>>>,
    analytics: DashMap<String, SessionAnalytics>,
    persistence: Option<Arc<dyn IPersistence>>,
}

pub(crate) fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> IntentLayerResult<MutexGuard<'a, T>> {
    mutex
        .lock()
        .map_err(|_| IntentLayerError::unavailable("session store", format!("{what} lock poisoned")))
}

fn session_not_found(id: &str) -> IntentLayerError {
    IntentLayerError::SessionNotFound { id: id.to_string() }
}

fn user_not_found(id: &str) -> IntentLayerError {
    IntentLayerError::UserNotFound { id: id.to_string() }
}

fn check_ownership(session_id: &str, session: &Session, interaction: &Interaction) -> IntentLayerResult<()> {
    if interaction.session_id != session.session_id || interaction.user_id != session.user_id {
        return Err(IntentLayerError::invalid_input(format!(
            "interaction {} does not belong to session {session_id}",
            interaction.id
        )));
    }
    Ok(())
}

impl SessionStore {
    /// Store without durability.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            sessions: DashMap::new(),
            users: DashMap::new(),
            analytics: DashMap::new(),
            persistence: None,
        }
    }

    /// Store that writes through to `persistence`.
    pub fn with_persistence(config: SessionConfig, persistence: Arc<dyn IPersistence>) -> Self {
        Self {
            persistence: Some(persistence),
            ..Self::new(config)
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub(crate) fn persist<F>(&self, write: F) -> IntentLayerResult<()>
    where
        F: FnOnce(&dyn IPersistence) -> IntentLayerResult<()>,
    {
        match &self.persistence {
            Some(persistence) => write(persistence.as_ref()),
            None => Ok(()),
        }
    }

    pub(crate) fn slot(&self, session_id: &str) -> Option<Arc<SessionSlot>> {
        self.sessions.get(session_id).map(|e| Arc::clone(e.value()))
    }

    pub(crate) fn user_record(&self, user_id: &str) -> Option<Arc<Mutex<UserRecord>>> {
        self.users.get(user_id).map(|e| Arc::clone(e.value()))
    }

    /// The user's record, created if absent. The flag is true when it was just created.
    fn user_record_or_create(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> (Arc<Mutex<UserRecord>>, bool) {
        match self.users.entry(user_id.to_string()) {
            Entry::Occupied(e) => (Arc::clone(e.get()), false),
            Entry::Vacant(e) => {
                let record = Arc::new(Mutex::new(UserRecord::new(UserProfile::new(user_id, now))));
                e.insert(Arc::clone(&record));
                (record, true)
            }
        }
    }

    /// The profile gate of a record, or `None` once the user is removed.
    fn profile_gate(&self, record_arc: &Arc<Mutex<UserRecord>>) -> IntentLayerResult<Option<Arc<Mutex<()>>>> {
        let record = lock(record_arc, "user")?;
        Ok((!record.removed).then(|| Arc::clone(&record.profile_gate)))
    }

    /// Undo a lazily created user record after a failed write.
    fn discard_fresh_record(&self, user_id: &str, record_arc: &Arc<Mutex<UserRecord>>, record: &mut UserRecord) {
        if record.is_disposable() {
            record.removed = true;
            self.users
                .remove_if(user_id, |_, v| Arc::ptr_eq(v, record_arc));
        }
    }

    // --- Sessions ---

    /// Create a session for `user_id`, creating the profile on first use.
    ///
    /// `user_data` is merged into the profile preferences (incoming keys win,
    /// other keys are kept). When the user already holds the maximum number of
    /// sessions, the least recently active ones are removed first.
    pub fn create_session(&self, user_id: &str, user_data: ValueMap) -> IntentLayerResult<SessionCreated> {
        self.create_session_at(user_id, user_data, Utc::now())
    }

    pub fn create_session_at(
        &self,
        user_id: &str,
        user_data: ValueMap,
        now: DateTime<Utc>,
    ) -> IntentLayerResult<SessionCreated> {
        if user_id.trim().is_empty() {
            return Err(IntentLayerError::invalid_input("user_id must not be empty"));
        }
        let _span = session_span!("create", user_id).entered();

        loop {
            let (record_arc, fresh) = self.user_record_or_create(user_id, now);
            let Some(gate) = self.profile_gate(&record_arc)? else {
                continue;
            };
            let _profile_write = lock(&gate, "profile gate")?;
            let mut record = lock(&record_arc, "user")?;
            if record.removed {
                continue;
            }

            let evicted = self.select_evictions(&record)?;
            let mut profile = record.profile.clone();
            profile.merge_preferences(&user_data);
            if now > profile.last_active {
                profile.last_active = now;
            }
            let session = Session::new(
                Uuid::new_v4().to_string(),
                user_id.to_string(),
                self.config.window_capacity,
                user_data,
                now,
            );

            if let Err(err) = self.persist(|p| p.commit_new_session(&session, &profile, &evicted)) {
                if fresh {
                    self.discard_fresh_record(user_id, &record_arc, &mut record);
                }
                return Err(err);
            }

            for id in &evicted {
                if let Some((_, slot)) = self.sessions.remove(id) {
                    if let Ok(mut state) = slot.state.lock() {
                        state.is_active = false;
                    }
                }
                self.analytics.remove(id);
                tracing::warn!(user_id, session_id = %id, "session cap reached, evicted least recently active session");
            }
            record.session_ids.retain(|id| !evicted.contains(id));
            record.session_ids.push(session.session_id.clone());
            record.profile = profile.clone();
            self.sessions.insert(
                session.session_id.clone(),
                Arc::new(SessionSlot {
                    user_id: user_id.to_string(),
                    state: Mutex::new(session.clone()),
                }),
            );

            tracing::info!(user_id, session_id = %session.session_id, new_user = fresh, "session created");
            return Ok(SessionCreated {
                session,
                profile,
                evicted,
                new_user: fresh,
            });
        }
    }

    /// Sessions to remove so one more fits under the cap, least recently active first.
    fn select_evictions(&self, record: &UserRecord) -> IntentLayerResult<Vec<String>> {
        let cap = self.config.max_sessions_per_user.max(1);
        if record.session_ids.len() < cap {
            return Ok(Vec::new());
        }
        let mut owned = Vec::with_capacity(record.session_ids.len());
        for id in &record.session_ids {
            if let Some(slot) = self.slot(id) {
                let state = lock(&slot.state, "session")?;
                owned.push((state.last_activity, state.created_at, id.clone()));
            }
        }
        if owned.len() < cap {
            return Ok(Vec::new());
        }
        owned.sort();
        let excess = owned.len() + 1 - cap;
        Ok(owned.into_iter().take(excess).map(|(_, _, id)| id).collect())
    }

    /// Snapshot of an active session.
    pub fn get_session(&self, session_id: &str) -> IntentLayerResult<Session> {
        let slot = self.slot(session_id).ok_or_else(|| session_not_found(session_id))?;
        let state = lock(&slot.state, "session")?;
        if !state.is_active {
            return Err(session_not_found(session_id));
        }
        Ok(state.clone())
    }

    /// Active sessions of a user, in creation order. Unknown users have none.
    pub fn list_sessions(&self, user_id: &str) -> IntentLayerResult<Vec<Session>> {
        let Some(record_arc) = self.user_record(user_id) else {
            return Ok(Vec::new());
        };
        let record = lock(&record_arc, "user")?;
        let mut sessions = Vec::new();
        for id in &record.session_ids {
            if let Some(slot) = self.slot(id) {
                let state = lock(&slot.state, "session")?;
                if state.is_active {
                    sessions.push(state.clone());
                }
            }
        }
        sessions.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        Ok(sessions)
    }

    /// Hard removal. Returns false when the session does not exist.
    pub fn delete_session(&self, session_id: &str) -> IntentLayerResult<bool> {
        let _span = session_span!("delete", session_id).entered();
        let Some(slot) = self.slot(session_id) else {
            return Ok(false);
        };
        self.remove_slot(session_id, &slot, |_| true)
    }

    /// Remove `slot` if `should_remove` still holds once both locks are taken.
    pub(crate) fn remove_slot<P>(
        &self,
        session_id: &str,
        slot: &Arc<SessionSlot>,
        should_remove: P,
    ) -> IntentLayerResult<bool>
    where
        P: FnOnce(&Session) -> bool,
    {
        let record_arc = self.user_record(&slot.user_id);
        let mut record = match &record_arc {
            Some(arc) => Some(lock(arc, "user")?),
            None => None,
        };
        let mut state = lock(&slot.state, "session")?;
        if !should_remove(&state) {
            return Ok(false);
        }
        self.persist(|p| p.delete_session(session_id).map(|_| ()))?;
        state.is_active = false;
        drop(state);

        let removed = self
            .sessions
            .remove_if(session_id, |_, v| Arc::ptr_eq(v, slot))
            .is_some();
        if let Some(record) = record.as_mut() {
            record.session_ids.retain(|id| id != session_id);
        }
        self.analytics.remove(session_id);
        Ok(removed)
    }

    // --- Turns ---

    /// Apply one completed turn to a session and its owner's profile.
    ///
    /// `build` receives the current session and a copy of the profile to
    /// update, and returns the interaction to append. Session, profile and
    /// interaction are persisted together, then swapped in; if `build` or the
    /// write fails nothing changes.
    ///
    /// Turns of one user are serialized by the profile gate so no profile
    /// update is lost. The user record itself is only locked to copy the
    /// profile and to swap it back, so plain appends to the user's other
    /// sessions proceed meanwhile.
    pub fn commit_turn<F>(&self, session_id: &str, build: F) -> IntentLayerResult<Interaction>
    where
        F: FnOnce(&Session, &mut UserProfile) -> IntentLayerResult<Interaction>,
    {
        let slot = self.slot(session_id).ok_or_else(|| session_not_found(session_id))?;
        let record_arc = self
            .user_record(&slot.user_id)
            .ok_or_else(|| user_not_found(&slot.user_id))?;
        let gate = self
            .profile_gate(&record_arc)?
            .ok_or_else(|| session_not_found(session_id))?;
        let _profile_write = lock(&gate, "profile gate")?;

        let mut profile = {
            let record = lock(&record_arc, "user")?;
            if record.removed {
                return Err(session_not_found(session_id));
            }
            record.profile.clone()
        };

        let mut state = lock(&slot.state, "session")?;
        if !state.is_active {
            return Err(session_not_found(session_id));
        }
        let interaction = build(&state, &mut profile)?;
        check_ownership(session_id, &state, &interaction)?;

        let mut next = state.clone();
        let evicted = next.push_interaction(interaction.clone());
        self.persist(|p| p.commit_turn(&next, &profile, &interaction))?;
        *state = next;
        let interaction_count = state.interaction_count;
        drop(state);

        let mut record = lock(&record_arc, "user")?;
        // Appends may have moved last_active on since the copy was taken.
        if record.profile.last_active > profile.last_active {
            profile.last_active = record.profile.last_active;
        }
        record.profile = profile;
        let dropped = record.push_history(interaction.clone(), self.config.max_history_per_user);
        drop(record);

        tracing::debug!(
            session_id,
            interaction_count,
            window_evicted = evicted.is_some(),
            history_dropped = dropped,
            "turn committed"
        );
        Ok(interaction)
    }

    /// Append a completed interaction to its session.
    ///
    /// Only the session's own lock is held across the write; the owner's
    /// record is locked briefly afterwards to advance `last_active` and
    /// mirror the interaction into the history.
    pub fn append_interaction(&self, session_id: &str, interaction: Interaction) -> IntentLayerResult<()> {
        let slot = self.slot(session_id).ok_or_else(|| session_not_found(session_id))?;
        let record_arc = self
            .user_record(&slot.user_id)
            .ok_or_else(|| user_not_found(&slot.user_id))?;

        let mut state = lock(&slot.state, "session")?;
        if !state.is_active {
            return Err(session_not_found(session_id));
        }
        check_ownership(session_id, &state, &interaction)?;

        let mut next = state.clone();
        let evicted = next.push_interaction(interaction.clone());
        self.persist(|p| p.commit_append(&next, &interaction))?;
        *state = next;
        let interaction_count = state.interaction_count;
        drop(state);

        let mut record = lock(&record_arc, "user")?;
        if record.removed {
            return Ok(());
        }
        if interaction.timestamp > record.profile.last_active {
            record.profile.last_active = interaction.timestamp;
        }
        let dropped = record.push_history(interaction, self.config.max_history_per_user);
        drop(record);

        tracing::debug!(
            session_id,
            interaction_count,
            window_evicted = evicted.is_some(),
            history_dropped = dropped,
            "interaction appended"
        );
        Ok(())
    }

    // --- Users ---

    pub fn user_profile(&self, user_id: &str) -> IntentLayerResult<UserProfile> {
        let record_arc = self.user_record(user_id).ok_or_else(|| user_not_found(user_id))?;
        let record = lock(&record_arc, "user")?;
        if record.removed {
            return Err(user_not_found(user_id));
        }
        Ok(record.profile.clone())
    }

    /// Merge `preferences` into the user's profile, creating it if needed.
    pub fn update_preferences(&self, user_id: &str, preferences: &ValueMap) -> IntentLayerResult<UserProfile> {
        if user_id.trim().is_empty() {
            return Err(IntentLayerError::invalid_input("user_id must not be empty"));
        }
        let now = Utc::now();
        loop {
            let (record_arc, fresh) = self.user_record_or_create(user_id, now);
            let Some(gate) = self.profile_gate(&record_arc)? else {
                continue;
            };
            let _profile_write = lock(&gate, "profile gate")?;
            let mut record = lock(&record_arc, "user")?;
            if record.removed {
                continue;
            }
            let mut profile = record.profile.clone();
            profile.merge_preferences(preferences);
            if let Err(err) = self.persist(|p| p.save_profile(&profile)) {
                if fresh {
                    self.discard_fresh_record(user_id, &record_arc, &mut record);
                }
                return Err(err);
            }
            record.profile = profile.clone();
            return Ok(profile);
        }
    }

    /// Remove a user's profile, history and sessions. Returns false for unknown users.
    pub fn delete_user(&self, user_id: &str) -> IntentLayerResult<bool> {
        let _span = session_span!("delete_user", user_id).entered();
        let Some(record_arc) = self.user_record(user_id) else {
            return Ok(false);
        };
        let Some(gate) = self.profile_gate(&record_arc)? else {
            return Ok(false);
        };
        let _profile_write = lock(&gate, "profile gate")?;
        let mut record = lock(&record_arc, "user")?;
        if record.removed {
            return Ok(false);
        }
        self.persist(|p| p.delete_user(user_id).map(|_| ()))?;

        for id in std::mem::take(&mut record.session_ids) {
            if let Some((_, slot)) = self.sessions.remove(&id) {
                if let Ok(mut state) = slot.state.lock() {
                    state.is_active = false;
                }
            }
            self.analytics.remove(&id);
        }
        record.history.clear();
        record.removed = true;
        drop(record);
        self.users.remove_if(user_id, |_, v| Arc::ptr_eq(v, &record_arc));
        tracing::info!(user_id, "user deleted");
        Ok(true)
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Number of active sessions.
    pub fn session_count(&self) -> usize {
        self.sessions
            .iter()
            .map(|e| Arc::clone(e.value()))
            .collect::<Vec<_>>()
            .into_iter()
            .filter(|slot| slot.state.lock().map(|s| s.is_active).unwrap_or(false))
            .count()
    }

    pub fn user_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.users.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    // --- Memory queries ---

    /// Full interaction history of a user, oldest first.
    pub fn history(&self, user_id: &str) -> IntentLayerResult<Vec<Interaction>> {
        let record_arc = self.user_record(user_id).ok_or_else(|| user_not_found(user_id))?;
        let record = lock(&record_arc, "user")?;
        Ok(record.history.clone())
    }

    /// Most relevant, then most recent, interactions of a user, optionally
    /// restricted to one session.
    pub fn user_context(
        &self,
        user_id: &str,
        session_id: Option<&str>,
        limit: usize,
    ) -> IntentLayerResult<Vec<Interaction>> {
        let mut entries: Vec<Interaction> = self
            .history(user_id)?
            .into_iter()
            .filter(|i| session_id.map_or(true, |sid| i.session_id == sid))
            .collect();
        entries.sort_by(|a, b| history_rank(b, a));
        entries.truncate(limit);
        Ok(entries)
    }

    /// Text search over a user's history. Zero-score entries are excluded.
    pub fn search_history(&self, user_id: &str, query: &str, limit: usize) -> IntentLayerResult<Vec<HistoryMatch>> {
        let query = query.trim().to_lowercase();
        let mut matches: Vec<HistoryMatch> = self
            .history(user_id)?
            .into_iter()
            .filter_map(|interaction| {
                let score = search_score(&interaction, &query);
                (score > 0.0).then_some(HistoryMatch { interaction, score })
            })
            .collect();
        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.interaction.timestamp.cmp(&a.interaction.timestamp))
        });
        matches.truncate(limit);
        Ok(matches)
    }

    /// Totals over every user's history. Users active within the last
    /// `active_window` of `now` count as active.
    pub fn memory_stats(&self, now: DateTime<Utc>, active_window: chrono::Duration) -> IntentLayerResult<MemoryStats> {
        let records: Vec<_> = self.users.iter().map(|e| Arc::clone(e.value())).collect();
        let mut total_entries = 0usize;
        let mut active_users = 0usize;
        for record_arc in &records {
            let record = lock(record_arc, "user")?;
            total_entries += record.history.len();
            if record.last_interaction() > now - active_window {
                active_users += 1;
            }
        }
        let total_users = records.len();
        let average = if total_users > 0 {
            (total_entries as f64 / total_users as f64 * 100.0).round() / 100.0
        } else {
            0.0
        };
        Ok(MemoryStats {
            total_users,
            total_entries,
            average_entries_per_user: average,
            active_users_last_week: active_users,
        })
    }

    // --- Analytics ---

    pub fn record_rank_latency(&self, session_id: &str, latency_ms: f64) {
        self.analytics
            .entry(session_id.to_string())
            .or_default()
            .record_latency(latency_ms);
    }

    pub fn record_turn_analytics(&self, session_id: &str, intent: &str, templates: &[String]) {
        let mut entry = self.analytics.entry(session_id.to_string()).or_default();
        entry.record_intent(intent);
        for template in templates {
            entry.record_template(template);
        }
    }

    pub fn analytics(&self, session_id: &str) -> Option<SessionAnalytics> {
        self.analytics.get(session_id).map(|a| a.clone())
    }

    // --- Startup ---

    /// Rebuild in-memory state from persisted users and sessions.
    ///
    /// Existing entries are kept. Returns `(users, sessions)` restored.
    pub fn restore(&self, users: Vec<PersistedUser>, sessions: Vec<Session>) -> IntentLayerResult<(usize, usize)> {
        let mut restored_users = 0;
        for persisted in users {
            let user_id = persisted.profile.user_id.clone();
            if self.users.contains_key(&user_id) {
                continue;
            }
            let mut record = UserRecord::new(persisted.profile);
            let cap = self.config.max_history_per_user;
            for interaction in persisted.interactions {
                record.push_history(interaction, cap);
            }
            self.users.insert(user_id, Arc::new(Mutex::new(record)));
            restored_users += 1;
        }

        let mut sessions = sessions;
        sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        let mut restored_sessions = 0;
        for mut session in sessions {
            if self.sessions.contains_key(&session.session_id) {
                continue;
            }
            session.window_capacity = self.config.window_capacity;
            while session.window.len() > session.window_capacity {
                session.window.pop_front();
            }
            let (record_arc, _) = self.user_record_or_create(&session.user_id, session.created_at);
            let mut record = lock(&record_arc, "user")?;
            record.session_ids.push(session.session_id.clone());
            drop(record);
            self.sessions.insert(
                session.session_id.clone(),
                Arc::new(SessionSlot {
                    user_id: session.user_id.clone(),
                    state: Mutex::new(session),
                }),
            );
            restored_sessions += 1;
        }
        tracing::info!(users = restored_users, sessions = restored_sessions, "session store restored");
        Ok((restored_users, restored_sessions))
    }
}
