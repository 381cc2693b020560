//! Background maintenance: idle expiry, hard purge, history retention.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use intentlayer_core::errors::IntentLayerResult;

use crate::store::{lock, SessionStore};

/// Outcome of [`SessionStore::prune_history`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneReport {
    pub interactions_removed: usize,
    pub users_removed: usize,
}

impl SessionStore {
    /// Deactivate every active session idle for longer than `idle_threshold`.
    ///
    /// Takes each session's lock before flipping it, so an in-flight turn on
    /// that session finishes first. Idempotent. Returns the number deactivated.
    pub fn expire_idle_sessions(&self, idle_threshold: Duration, now: DateTime<Utc>) -> IntentLayerResult<usize> {
        let slots: Vec<_> = self.sessions.iter().map(|e| Arc::clone(e.value())).collect();
        let mut expired = 0;
        for slot in slots {
            let mut state = lock(&slot.state, "session")?;
            if !state.is_active || state.idle_duration(now) <= idle_threshold {
                continue;
            }
            let mut next = state.clone();
            next.is_active = false;
            self.persist(|p| p.save_session(&next))?;
            *state = next;
            expired += 1;
            tracing::debug!(session_id = %state.session_id, user_id = %state.user_id, "session expired");
        }
        if expired > 0 {
            tracing::info!(expired, "idle sessions expired");
        }
        Ok(expired)
    }

    /// Hard-remove inactive sessions whose last activity is older than `older_than`.
    pub fn purge_inactive_sessions(&self, older_than: Duration, now: DateTime<Utc>) -> IntentLayerResult<usize> {
        let slots: Vec<_> = self
            .sessions
            .iter()
            .map(|e| (e.key().clone(), Arc::clone(e.value())))
            .collect();
        let is_stale = |session: &intentlayer_core::Session| {
            !session.is_active && session.idle_duration(now) > older_than
        };
        let mut purged = 0;
        for (session_id, slot) in slots {
            let candidate = is_stale(&*lock(&slot.state, "session")?);
            if candidate && self.remove_slot(&session_id, &slot, is_stale)? {
                purged += 1;
            }
        }
        if purged > 0 {
            tracing::info!(purged, "inactive sessions purged");
        }
        Ok(purged)
    }

    /// Drop history older than `retention`. Users left with no history, no
    /// preferences and no sessions are removed.
    pub fn prune_history(&self, retention: Duration, now: DateTime<Utc>) -> IntentLayerResult<PruneReport> {
        let cutoff = now - retention;
        self.persist(|p| p.prune_interactions(cutoff).map(|_| ()))?;

        let records: Vec<_> = self
            .users
            .iter()
            .map(|e| (e.key().clone(), Arc::clone(e.value())))
            .collect();
        let mut report = PruneReport::default();
        for (user_id, record_arc) in records {
            let mut record = lock(&record_arc, "user")?;
            if record.removed {
                continue;
            }
            report.interactions_removed += record.prune_before(cutoff);
            if record.is_disposable() {
                self.persist(|p| p.delete_user(&user_id).map(|_| ()))?;
                record.removed = true;
                drop(record);
                self.users.remove_if(&user_id, |_, v| Arc::ptr_eq(v, &record_arc));
                report.users_removed += 1;
            }
        }
        if report.interactions_removed > 0 || report.users_removed > 0 {
            tracing::info!(
                interactions_removed = report.interactions_removed,
                users_removed = report.users_removed,
                "history pruned"
            );
        }
        Ok(report)
    }
}
