use std::cmp::Ordering;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use intentlayer_core::models::{Interaction, UserProfile};

/// In-memory state of one user: profile, owned session ids, durable-log mirror.
#[derive(Debug, Clone)]
pub(crate) struct UserRecord {
    pub profile: UserProfile,
    /// Session ids in creation order.
    pub session_ids: Vec<String>,
    /// Interaction history, oldest first.
    pub history: Vec<Interaction>,
    /// Set once the user is deleted; holders of a stale handle must re-fetch.
    pub removed: bool,
    /// Held by every writer of the profile for its whole read-modify-write,
    /// taken before this record's own lock. Appends and reads never take it.
    pub profile_gate: Arc<Mutex<()>>,
}

impl UserRecord {
    pub fn new(profile: UserProfile) -> Self {
        Self {
            profile,
            session_ids: Vec::new(),
            history: Vec::new(),
            removed: false,
            profile_gate: Arc::new(Mutex::new(())),
        }
    }

    /// Append to the history. Over `cap`, entries with the lowest
    /// `(relevance_score, timestamp)` go first. Returns how many were dropped.
    pub fn push_history(&mut self, interaction: Interaction, cap: usize) -> usize {
        self.history.push(interaction);
        let mut dropped = 0;
        while self.history.len() > cap {
            let Some(weakest) = self
                .history
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| history_rank(a, b))
                .map(|(idx, _)| idx)
            else {
                break;
            };
            self.history.remove(weakest);
            dropped += 1;
        }
        dropped
    }

    /// Drop history entries older than `cutoff`. Returns how many were dropped.
    pub fn prune_before(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.history.len();
        self.history.retain(|i| i.timestamp >= cutoff);
        before - self.history.len()
    }

    /// Nothing worth keeping: no history, no preferences, no sessions.
    pub fn is_disposable(&self) -> bool {
        self.history.is_empty()
            && self.profile.preferences.is_empty()
            && self.session_ids.is_empty()
    }

    /// Timestamp of the most recent interaction, or the profile's last activity.
    pub fn last_interaction(&self) -> DateTime<Utc> {
        self.history
            .iter()
            .map(|i| i.timestamp)
            .max()
            .unwrap_or(self.profile.last_active)
    }
}

/// Ascending by relevance, then by timestamp.
pub(crate) fn history_rank(a: &Interaction, b: &Interaction) -> Ordering {
    a.relevance_score
        .partial_cmp(&b.relevance_score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.timestamp.cmp(&b.timestamp))
}
