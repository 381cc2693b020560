//! Session: one conversation of one user, with a bounded short-term window.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Interaction, ValueMap};

/// Per-session state.
///
/// `interaction_count >= window.len()` always holds, and `last_activity`
/// never moves backwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    /// Completed turns, incremented once per accepted append.
    pub interaction_count: u64,
    pub is_active: bool,
    /// Most recent interactions, oldest first.
    pub window: VecDeque<Interaction>,
    pub window_capacity: usize,
    /// Payload supplied when the session was created.
    #[serde(default)]
    pub user_data: ValueMap,
    /// Context merged from every turn; later keys win.
    #[serde(default)]
    pub context: ValueMap,
}

impl Session {
    pub fn new(
        session_id: String,
        user_id: String,
        window_capacity: usize,
        user_data: ValueMap,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id,
            user_id,
            created_at: now,
            last_activity: now,
            interaction_count: 0,
            is_active: true,
            window: VecDeque::with_capacity(window_capacity),
            window_capacity,
            user_data,
            context: ValueMap::new(),
        }
    }

    /// Advance `last_activity`, never backwards.
    pub fn touch(&mut self, at: DateTime<Utc>) {
        if at > self.last_activity {
            self.last_activity = at;
        }
    }

    /// Apply one completed turn. Returns the interaction evicted from the window, if any.
    pub fn push_interaction(&mut self, interaction: Interaction) -> Option<Interaction> {
        self.interaction_count += 1;
        self.touch(interaction.timestamp);
        for (key, value) in &interaction.context {
            self.context.insert(key.clone(), value.clone());
        }
        self.window.push_back(interaction);
        if self.window.len() > self.window_capacity {
            self.window.pop_front()
        } else {
            None
        }
    }

    /// Up to `k` most recent non-empty user inputs, most recent first.
    pub fn recent_inputs(&self, k: usize) -> Vec<&str> {
        self.window
            .iter()
            .rev()
            .map(|i| i.user_input.as_str())
            .filter(|input| !input.trim().is_empty())
            .take(k)
            .collect()
    }

    pub fn idle_duration(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.last_activity
    }
}
