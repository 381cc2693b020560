//! Property tests for core models, config and text helpers.

use chrono::{Duration, TimeZone, Utc};
use intentlayer_core::config::RankingWeights;
use intentlayer_core::models::*;
use intentlayer_core::text::tokenize;
use proptest::prelude::*;

fn turn(n: usize, offset_secs: i64) -> Interaction {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Interaction {
        id: format!("i{n}"),
        timestamp: base + Duration::seconds(offset_secs),
        session_id: "s".into(),
        user_id: "u".into(),
        user_input: format!("turn {n}"),
        intent: "search".into(),
        entities: Default::default(),
        context: Default::default(),
        ui_generated: UiSummary::default(),
        relevance_score: 0.5,
    }
}

proptest! {
    #[test]
    fn prop_window_keeps_latest_turns(
        capacity in 1usize..6,
        offsets in proptest::collection::vec(-1_000i64..1_000, 0..30),
    ) {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut session = Session::new("s".into(), "u".into(), capacity, ValueMap::new(), start);
        let mut last = session.last_activity;
        for (n, offset) in offsets.iter().enumerate() {
            session.push_interaction(turn(n, *offset));
            prop_assert!(session.last_activity >= last);
            last = session.last_activity;
        }
        prop_assert_eq!(session.interaction_count, offsets.len() as u64);
        prop_assert_eq!(session.window.len(), offsets.len().min(capacity));
        let expected_first = offsets.len().saturating_sub(capacity);
        if let Some(front) = session.window.front() {
            prop_assert_eq!(front.id.clone(), format!("i{expected_first}"));
        }
    }

    #[test]
    fn prop_tokens_are_lowercase_alphanumeric(text in "[ -~]{0,64}") {
        for token in tokenize(&text) {
            prop_assert!(!token.is_empty());
            prop_assert!(token.chars().all(char::is_alphanumeric));
            prop_assert_eq!(token.to_lowercase(), token.clone());
        }
    }

    #[test]
    fn prop_normalized_weights_validate(a in 0.0f64..1.0, b in 0.0f64..1.0, c in 0.0f64..1.0, d in 0.01f64..1.0) {
        let total = a + b + c + d;
        let weights = RankingWeights {
            similarity: a / total,
            tag_overlap: b / total,
            preference_affinity: c / total,
            recency: d / total,
        };
        prop_assert!(weights.validate().is_ok());
    }
}
