//! Property tests for ranking determinism and bounds.

use std::sync::Arc;

use chrono::Utc;
use intentlayer_catalog::{KeywordIndex, TemplateCatalog};
use intentlayer_core::config::RankingConfig;
use intentlayer_core::models::{IntentAnalysis, Session, UserProfile, ValueMap};
use intentlayer_retrieval::Ranker;
use proptest::prelude::*;

fn ranker(top_k: usize) -> Ranker {
    let catalog = Arc::new(TemplateCatalog::load_dir(&test_fixtures::catalog_dir()).unwrap());
    let index = Arc::new(KeywordIndex::build(&catalog));
    Ranker::new(
        catalog,
        index,
        RankingConfig {
            top_k,
            ..RankingConfig::default()
        },
    )
}

fn intent_strategy() -> impl Strategy<Value = IntentAnalysis> {
    let intents = prop::sample::select(vec![
        "booking_request",
        "search_products",
        "support",
        "purchase",
        "question",
        "unknown_intent",
    ]);
    let words = prop::sample::select(vec!["party", "time", "shoes", "price", "email", "20h", "4", "zebra"]);
    (intents, prop::collection::vec((words.clone(), words), 0..4)).prop_map(|(intent, entities)| {
        entities
            .into_iter()
            .fold(IntentAnalysis::new(intent), |a, (slot, value)| a.with_entity(slot, value))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_rank_is_deterministic_and_bounded(analysis in intent_strategy(), top_k in 1usize..8) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let ranker = ranker(top_k);
        let now = Utc::now();
        let session = Session::new("s".into(), "u".into(), 10, ValueMap::new(), now);
        let profile = UserProfile::new("u", now);

        let first = rt.block_on(ranker.rank(&analysis, &session, &profile)).unwrap();
        let second = rt.block_on(ranker.rank(&analysis, &session, &profile)).unwrap();

        prop_assert_eq!(&first, &second);
        prop_assert!(!first.is_empty());
        prop_assert!(first.len() <= top_k);
        for pair in first.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
        for candidate in &first {
            prop_assert!((0.0..=1.0).contains(&candidate.score));
            prop_assert!(ranker.catalog().contains(&candidate.item));
        }
    }
}
