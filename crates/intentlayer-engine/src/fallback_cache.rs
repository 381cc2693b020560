//! Last composed UI per user and intent, served when ranking misses its deadline.
//!
//! `moka::sync::Cache` bounded by entry count and age, with hit/miss counters.
//! Entries are keyed by user so one user's entities and preferences never
//! reach another; the engine refits props to the current turn before serving.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::sync::Cache;

use intentlayer_core::models::UIDescription;

type CacheKey = (String, String);

pub struct FallbackCache {
    cache: Cache<CacheKey, UIDescription>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl FallbackCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(capacity).time_to_live(ttl).build();
        Self {
            cache,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn key(user_id: &str, intent: &str) -> CacheKey {
        (user_id.to_string(), intent.to_string())
    }

    pub fn get(&self, user_id: &str, intent: &str) -> Option<UIDescription> {
        match self.cache.get(&Self::key(user_id, intent)) {
            Some(ui) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(ui)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn insert(&self, user_id: &str, intent: &str, ui: UIDescription) {
        self.cache.insert(Self::key(user_id, intent), ui);
    }

    pub fn invalidate(&self, user_id: &str, intent: &str) {
        self.cache.invalidate(&Self::key(user_id, intent));
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            return 0.0;
        }
        hits as f64 / total as f64
    }
}
