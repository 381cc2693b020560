//! Property tests for the SQLite persistence layer.

use chrono::{Duration, TimeZone, Utc};
use intentlayer_core::models::*;
use intentlayer_core::traits::IPersistence;
use intentlayer_storage::StorageEngine;
use proptest::prelude::*;

fn turn(session: &Session, n: i64, input: &str) -> Interaction {
    Interaction {
        id: format!("{}-{n}", session.session_id),
        timestamp: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(n),
        session_id: session.session_id.clone(),
        user_id: session.user_id.clone(),
        user_input: input.to_string(),
        intent: "browse".into(),
        entities: Default::default(),
        context: Default::default(),
        ui_generated: UiSummary::default(),
        relevance_score: 0.5,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Whatever was committed comes back unchanged, and the history
    /// limit is honoured.
    #[test]
    fn committed_turns_reload_verbatim(
        inputs in prop::collection::vec("[a-z ]{0,24}", 1..12),
        limit in 1usize..16,
    ) {
        let engine = StorageEngine::open_in_memory().unwrap();
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let profile = UserProfile::new("u", now);
        let mut session = Session::new("s".into(), "u".into(), 4, ValueMap::new(), now);
        engine.commit_new_session(&session, &profile, &[]).unwrap();

        let mut committed = Vec::new();
        for (n, input) in inputs.iter().enumerate() {
            let interaction = turn(&session, n as i64, input);
            session.push_interaction(interaction.clone());
            engine.commit_turn(&session, &profile, &interaction).unwrap();
            committed.push(interaction);
        }

        let users = engine.load_users(limit).unwrap();
        let expected = &committed[committed.len().saturating_sub(limit)..];
        prop_assert_eq!(&users[0].interactions[..], expected);
        prop_assert_eq!(engine.load_sessions().unwrap(), vec![session]);
    }
}
