//! Composite relevance scorer (4 terms).
//!
//! Terms: semantic similarity, tag overlap, preference affinity, category
//! recency. Each is normalized to [0.0, 1.0] before weighting.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde_json::Value;

use intentlayer_core::config::RankingWeights;
use intentlayer_core::models::{MatchedSignals, UserProfile};

/// Preference key holding a list of favoured categories.
pub const PREFERRED_CATEGORIES_KEY: &str = "preferred_categories";

/// Overlap coefficient between the candidate's keywords and the query signals.
///
/// `|matched| / min(|keywords|, |signals|)`, 0.0 when either side is empty.
pub fn tag_overlap(signals: &BTreeSet<String>, keywords: &BTreeSet<String>) -> (f64, Vec<String>) {
    if signals.is_empty() || keywords.is_empty() {
        return (0.0, Vec::new());
    }
    let matched: Vec<String> = keywords.intersection(signals).cloned().collect();
    let denominator = signals.len().min(keywords.len()) as f64;
    ((matched.len() as f64 / denominator).min(1.0), matched)
}

/// How strongly the stored preferences favour `category`.
///
/// Listed under [`PREFERRED_CATEGORIES_KEY`] → 1.0; a preference keyed by the
/// category itself counts as a number (clamped), a boolean, or a string equal
/// to the category.
pub fn preference_affinity(profile: &UserProfile, category: &str) -> f64 {
    if category.is_empty() {
        return 0.0;
    }
    let category = category.to_lowercase();
    let listed = profile
        .preferences
        .get(PREFERRED_CATEGORIES_KEY)
        .and_then(Value::as_array)
        .is_some_and(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .any(|v| v.eq_ignore_ascii_case(&category))
        });
    if listed {
        return 1.0;
    }
    match profile.preferences.get(&category) {
        Some(Value::Number(n)) => n.as_f64().map_or(0.0, |v| v.clamp(0.0, 1.0)),
        Some(Value::Bool(true)) => 1.0,
        Some(Value::String(s)) if s.eq_ignore_ascii_case(&category) => 1.0,
        _ => 0.0,
    }
}

/// `0.5^(hours since last successful use / half_life)`, 0.0 when never used.
pub fn recency_boost(profile: &UserProfile, category: &str, now: DateTime<Utc>, half_life_hours: f64) -> f64 {
    let Some(last_used) = profile.category_usage.get(category) else {
        return 0.0;
    };
    let hours = (now - *last_used).num_seconds().max(0) as f64 / 3600.0;
    0.5_f64.powf(hours / half_life_hours).clamp(0.0, 1.0)
}

/// Weighted sum of the normalized terms.
pub fn composite(weights: &RankingWeights, signals: &MatchedSignals) -> f64 {
    let score = weights.similarity * signals.similarity
        + weights.tag_overlap * signals.tag_overlap
        + weights.preference_affinity * signals.preference_affinity
        + weights.recency * signals.recency;
    score.clamp(0.0, 1.0)
}
