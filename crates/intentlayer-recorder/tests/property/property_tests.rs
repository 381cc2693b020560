//! Property tests for the context summary.

use intentlayer_recorder::summary::append_clause;
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_summary_never_exceeds_cap(
        clauses in prop::collection::vec("[a-z_]{1,30}", 1..30),
        cap in 1usize..120,
    ) {
        let mut summary = String::new();
        for clause in &clauses {
            summary = append_clause(&summary, clause, cap);
            prop_assert!(summary.chars().count() <= cap);
        }
    }

    #[test]
    fn prop_latest_clause_is_kept_when_it_fits(
        clauses in prop::collection::vec("[a-z]{1,10}", 1..20),
    ) {
        let mut summary = String::new();
        for clause in &clauses {
            summary = append_clause(&summary, clause, 64);
            prop_assert!(summary.ends_with(clause.as_str()));
        }
    }
}
