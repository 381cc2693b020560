//! Property tests for the session store.

use chrono::{Duration, Utc};
use intentlayer_core::config::SessionConfig;
use intentlayer_core::models::*;
use intentlayer_session::SessionStore;
use proptest::prelude::*;

fn turn(session: &Session, n: usize) -> Interaction {
    Interaction {
        id: format!("{n}"),
        timestamp: Utc::now(),
        session_id: session.session_id.clone(),
        user_id: session.user_id.clone(),
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
    fn prop_window_bounded_and_count_exact(capacity in 1usize..8, appends in 0usize..40) {
        let store = SessionStore::new(SessionConfig {
            window_capacity: capacity,
            ..SessionConfig::default()
        });
        let session = store.create_session("u", ValueMap::new()).unwrap().session;
        for n in 0..appends {
            store.append_interaction(&session.session_id, turn(&session, n)).unwrap();
        }
        let current = store.get_session(&session.session_id).unwrap();
        prop_assert_eq!(current.interaction_count as usize, appends);
        prop_assert_eq!(current.window.len(), appends.min(capacity));
        if appends > capacity {
            let oldest_kept = appends - capacity;
            prop_assert_eq!(current.window.front().map(|i| i.id.clone()), Some(oldest_kept.to_string()));
        }
    }

    #[test]
    fn prop_session_count_never_exceeds_cap(cap in 1usize..6, creates in 1usize..20) {
        let store = SessionStore::new(SessionConfig {
            max_sessions_per_user: cap,
            ..SessionConfig::default()
        });
        for _ in 0..creates {
            store.create_session("u", ValueMap::new()).unwrap();
        }
        prop_assert_eq!(store.list_sessions("u").unwrap().len(), creates.min(cap));
    }

    #[test]
    fn prop_expiry_idempotent(ages_minutes in prop::collection::vec(0i64..240, 1..10)) {
        let store = SessionStore::new(SessionConfig {
            max_sessions_per_user: 20,
            ..SessionConfig::default()
        });
        let now = Utc::now();
        for age in &ages_minutes {
            store.create_session_at("u", ValueMap::new(), now - Duration::minutes(*age)).unwrap();
        }
        let first = store.expire_idle_sessions(Duration::hours(1), now).unwrap();
        let active_after_first: Vec<String> = store.list_sessions("u").unwrap().into_iter().map(|s| s.session_id).collect();
        let second = store.expire_idle_sessions(Duration::hours(1), now).unwrap();
        let active_after_second: Vec<String> = store.list_sessions("u").unwrap().into_iter().map(|s| s.session_id).collect();

        prop_assert_eq!(first, ages_minutes.iter().filter(|a| **a > 60).count());
        prop_assert_eq!(second, 0);
        prop_assert_eq!(active_after_first, active_after_second);
    }
}
