use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use dashmap::DashMap;

use intentlayer_core::models::GlobalStatsSnapshot;

/// Process-wide aggregate counters.
///
/// Every update is a commutative increment, so concurrent turns never
/// serialize on it.
#[derive(Debug)]
pub struct GlobalStats {
    total_users: AtomicU64,
    total_sessions: AtomicU64,
    total_interactions: AtomicU64,
    intent_counts: DashMap<String, u64>,
    category_counts: DashMap<String, u64>,
    last_updated_ms: AtomicI64,
    top_k: usize,
}

impl GlobalStats {
    pub fn new(top_k: usize) -> Self {
        Self {
            total_users: AtomicU64::new(0),
            total_sessions: AtomicU64::new(0),
            total_interactions: AtomicU64::new(0),
            intent_counts: DashMap::new(),
            category_counts: DashMap::new(),
            last_updated_ms: AtomicI64::new(Utc::now().timestamp_millis()),
            top_k,
        }
    }

    /// Counters restored from a persisted snapshot.
    pub fn from_snapshot(snapshot: &GlobalStatsSnapshot, top_k: usize) -> Self {
        let stats = Self::new(top_k);
        stats.total_users.store(snapshot.total_users, Ordering::Relaxed);
        stats.total_sessions.store(snapshot.total_sessions, Ordering::Relaxed);
        stats
            .total_interactions
            .store(snapshot.total_interactions, Ordering::Relaxed);
        for (intent, count) in &snapshot.intent_counts {
            stats.intent_counts.insert(intent.clone(), *count);
        }
        for (category, count) in &snapshot.category_counts {
            stats.category_counts.insert(category.clone(), *count);
        }
        stats
            .last_updated_ms
            .store(snapshot.last_updated.timestamp_millis(), Ordering::Relaxed);
        stats
    }

    pub fn record_session(&self, new_user: bool) {
        if new_user {
            self.total_users.fetch_add(1, Ordering::Relaxed);
        }
        self.total_sessions.fetch_add(1, Ordering::Relaxed);
        self.touch();
    }

    pub fn record_user_removed(&self) {
        let _ = self
            .total_users
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| Some(n.saturating_sub(1)));
        self.touch();
    }

    pub fn record_interaction(&self, intent: &str, categories: &[String]) {
        self.total_interactions.fetch_add(1, Ordering::Relaxed);
        *self.intent_counts.entry(intent.to_string()).or_insert(0) += 1;
        for category in categories {
            *self.category_counts.entry(category.clone()).or_insert(0) += 1;
        }
        self.touch();
    }

    fn touch(&self) {
        self.last_updated_ms
            .fetch_max(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    pub fn total_users(&self) -> u64 {
        self.total_users.load(Ordering::Relaxed)
    }

    pub fn total_sessions(&self) -> u64 {
        self.total_sessions.load(Ordering::Relaxed)
    }

    pub fn total_interactions(&self) -> u64 {
        self.total_interactions.load(Ordering::Relaxed)
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.last_updated_ms.load(Ordering::Relaxed))
            .single()
            .unwrap_or_else(Utc::now)
    }

    /// Point-in-time copy with the top-K lists and the average session length.
    pub fn snapshot(&self) -> GlobalStatsSnapshot {
        let intent_counts: BTreeMap<String, u64> = self
            .intent_counts
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect();
        let category_counts: BTreeMap<String, u64> = self
            .category_counts
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect();
        let sessions = self.total_sessions();
        let interactions = self.total_interactions();
        GlobalStatsSnapshot {
            total_users: self.total_users(),
            total_sessions: sessions,
            total_interactions: interactions,
            most_common_intents: top_k(&intent_counts, self.top_k),
            most_active_categories: top_k(&category_counts, self.top_k),
            intent_counts,
            category_counts,
            average_session_length: if sessions > 0 {
                interactions as f64 / sessions as f64
            } else {
                0.0
            },
            last_updated: self.last_updated(),
        }
    }
}

/// Highest counts first, ties by key.
fn top_k(counts: &BTreeMap<String, u64>, k: usize) -> Vec<(String, u64)> {
    let mut sorted: Vec<(String, u64)> = counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted.truncate(k);
    sorted
}
