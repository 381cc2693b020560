use std::sync::Arc;
use std::thread;

use intentlayer_recorder::GlobalStats;

#[test]
fn snapshot_reports_top_lists_and_average() {
    let stats = GlobalStats::new(2);
    stats.record_session(true);
    stats.record_session(false);
    stats.record_interaction("search", &["search".to_string()]);
    stats.record_interaction("search", &["search".to_string(), "action".to_string()]);
    stats.record_interaction("booking_request", &["booking".to_string()]);
    stats.record_interaction("support", &[]);

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.total_users, 1);
    assert_eq!(snapshot.total_sessions, 2);
    assert_eq!(snapshot.total_interactions, 4);
    assert_eq!(
        snapshot.most_common_intents,
        vec![("search".to_string(), 2), ("booking_request".to_string(), 1)]
    );
    assert_eq!(
        snapshot.most_active_categories,
        vec![("search".to_string(), 2), ("action".to_string(), 1)]
    );
    assert!((snapshot.average_session_length - 2.0).abs() < f64::EPSILON);
}

#[test]
fn restore_continues_from_snapshot() {
    let stats = GlobalStats::new(5);
    stats.record_session(true);
    stats.record_interaction("search", &["search".to_string()]);
    let snapshot = stats.snapshot();

    let restored = GlobalStats::from_snapshot(&snapshot, 5);
    restored.record_interaction("search", &[]);
    let again = restored.snapshot();
    assert_eq!(again.total_users, 1);
    assert_eq!(again.total_interactions, 2);
    assert_eq!(again.intent_counts.get("search"), Some(&2));
    assert!(again.last_updated >= snapshot.last_updated);
}

#[test]
fn user_removal_never_underflows() {
    let stats = GlobalStats::new(5);
    stats.record_user_removed();
    assert_eq!(stats.total_users(), 0);
}

#[test]
fn concurrent_increments_are_not_lost() {
    let stats = Arc::new(GlobalStats::new(5));
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let stats = Arc::clone(&stats);
            thread::spawn(move || {
                for _ in 0..500 {
                    stats.record_interaction(if t % 2 == 0 { "even" } else { "odd" }, &["c".to_string()]);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    let snapshot = stats.snapshot();
    assert_eq!(snapshot.total_interactions, 4000);
    assert_eq!(snapshot.intent_counts.get("even"), Some(&2000));
    assert_eq!(snapshot.category_counts.get("c"), Some(&4000));
}
