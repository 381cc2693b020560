use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use intentlayer_catalog::{KeywordIndex, TemplateCatalog};
use intentlayer_core::config::RankingConfig;
use intentlayer_core::models::*;
use intentlayer_core::traits::{IKnowledgeIndex, KnowledgeQuery};
use intentlayer_core::{ErrorKind, IntentLayerError, IntentLayerResult};
use intentlayer_retrieval::Ranker;
use serde_json::json;

fn fixture_catalog() -> Arc<TemplateCatalog> {
    Arc::new(TemplateCatalog::load_dir(&test_fixtures::catalog_dir()).unwrap())
}

fn keyword_ranker(config: RankingConfig) -> Ranker {
    let catalog = fixture_catalog();
    let index = Arc::new(KeywordIndex::build(&catalog));
    Ranker::new(catalog, index, config)
}

fn session() -> Session {
    Session::new("s1".into(), "u1".into(), 10, ValueMap::new(), Utc::now())
}

fn profile() -> UserProfile {
    UserProfile::new("u1", Utc::now())
}

fn booking() -> IntentAnalysis {
    IntentAnalysis::new("booking_request")
        .with_entity("party_size", "4")
        .with_entity("time", "20h")
}

fn position(ranked: &[RankedCandidate], item: &ItemRef) -> Option<usize> {
    ranked.iter().position(|c| &c.item == item)
}

/// Index that answers with a fixed list.
struct StaticIndex(Vec<SearchHit>);

#[async_trait]
impl IKnowledgeIndex for StaticIndex {
    async fn search(&self, _: &KnowledgeQuery) -> IntentLayerResult<Vec<SearchHit>> {
        Ok(self.0.clone())
    }
    fn name(&self) -> &str {
        "static"
    }
}

/// Index that never answers within any reasonable deadline.
struct SlowIndex;

#[async_trait]
impl IKnowledgeIndex for SlowIndex {
    async fn search(&self, _: &KnowledgeQuery) -> IntentLayerResult<Vec<SearchHit>> {
        tokio::time::sleep(StdDuration::from_secs(60)).await;
        Ok(Vec::new())
    }
    fn name(&self) -> &str {
        "slow"
    }
}

struct BrokenIndex;

#[async_trait]
impl IKnowledgeIndex for BrokenIndex {
    async fn search(&self, _: &KnowledgeQuery) -> IntentLayerResult<Vec<SearchHit>> {
        Err(IntentLayerError::unavailable("index", "connection refused"))
    }
    fn name(&self) -> &str {
        "broken"
    }
}

// ── Scenarios ────────────────────────────────────────────────────────────

#[test]
fn booking_request_ranks_booking_form_above_contact_form() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ranker = keyword_ranker(RankingConfig {
        top_k: 20,
        ..RankingConfig::default()
    });
    let ranked = rt.block_on(ranker.rank(&booking(), &session(), &profile())).unwrap();

    let booking_form = position(&ranked, &ItemRef::Component("BookingForm".into())).unwrap();
    if let Some(contact) = position(&ranked, &ItemRef::Component("ContactForm".into())) {
        assert!(booking_form < contact);
    }
    let first_component = ranked.iter().find(|c| c.item.is_component()).unwrap();
    assert_eq!(first_component.item.name(), "BookingForm");
    assert!(first_component.signals.matched_tags.contains(&"booking".to_string()));
}

#[test]
fn empty_catalog_is_exhausted() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let catalog = Arc::new(TemplateCatalog::empty());
    let index = Arc::new(KeywordIndex::build(&catalog));
    let ranker = Ranker::new(catalog, index, RankingConfig::default());

    let err = rt.block_on(ranker.rank(&booking(), &session(), &profile())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Exhausted);
    assert_eq!(
        ranker.rank_offline(&booking(), &profile()).unwrap_err().kind(),
        ErrorKind::Exhausted
    );
}

// ── Ordering ─────────────────────────────────────────────────────────────

#[test]
fn output_is_sorted_capped_and_in_unit_range() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ranker = keyword_ranker(RankingConfig {
        top_k: 3,
        ..RankingConfig::default()
    });
    let analysis = IntentAnalysis::new("search_products").with_entity("query", "shoes");
    let ranked = rt.block_on(ranker.rank(&analysis, &session(), &profile())).unwrap();

    assert!(!ranked.is_empty());
    assert!(ranked.len() <= 3);
    for pair in ranked.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    for candidate in &ranked {
        assert!((0.0..=1.0).contains(&candidate.score));
    }
}

#[test]
fn identical_input_gives_identical_output() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ranker = keyword_ranker(RankingConfig::default());
    let first = rt.block_on(ranker.rank(&booking(), &session(), &profile())).unwrap();
    for _ in 0..5 {
        let again = rt.block_on(ranker.rank(&booking(), &session(), &profile())).unwrap();
        assert_eq!(again, first);
    }
}

#[test]
fn ties_break_on_similarity_then_name() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let hits = vec![
        SearchHit { item: ItemRef::Component("SearchBar".into()), similarity: 0.4 },
        SearchHit { item: ItemRef::Component("ResultList".into()), similarity: 0.4 },
        SearchHit { item: ItemRef::Component("ProductCard".into()), similarity: 0.8 },
    ];
    let config = RankingConfig {
        weights: intentlayer_core::config::RankingWeights {
            similarity: 1.0,
            tag_overlap: 0.0,
            preference_affinity: 0.0,
            recency: 0.0,
        },
        ..RankingConfig::default()
    };
    let ranker = Ranker::new(fixture_catalog(), Arc::new(StaticIndex(hits)), config);
    let ranked = rt
        .block_on(ranker.rank(&IntentAnalysis::new("browse"), &session(), &profile()))
        .unwrap();
    let names: Vec<&str> = ranked.iter().map(|c| c.item.name()).collect();
    assert_eq!(names, vec!["ProductCard", "ResultList", "SearchBar"]);
}

// ── Profile signals ──────────────────────────────────────────────────────

#[test]
fn preferred_category_lifts_a_candidate() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let hits = vec![
        SearchHit { item: ItemRef::Component("ContactForm".into()), similarity: 0.5 },
        SearchHit { item: ItemRef::Component("ProductCard".into()), similarity: 0.5 },
    ];
    let ranker = Ranker::new(fixture_catalog(), Arc::new(StaticIndex(hits)), RankingConfig::default());

    let mut profile = profile();
    profile
        .preferences
        .insert("preferred_categories".into(), json!(["communication"]));
    let ranked = rt
        .block_on(ranker.rank(&IntentAnalysis::new("browse"), &session(), &profile))
        .unwrap();
    assert_eq!(ranked[0].item, ItemRef::Component("ContactForm".into()));
    assert_eq!(ranked[0].signals.preference_affinity, 1.0);
}

#[test]
fn recently_used_category_gets_a_boost() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let hits = vec![
        SearchHit { item: ItemRef::Component("ContactForm".into()), similarity: 0.5 },
        SearchHit { item: ItemRef::Component("ProductCard".into()), similarity: 0.5 },
    ];
    let ranker = Ranker::new(fixture_catalog(), Arc::new(StaticIndex(hits)), RankingConfig::default());

    let mut profile = profile();
    profile
        .category_usage
        .insert("commerce".into(), Utc::now() - Duration::hours(1));
    let ranked = rt
        .block_on(ranker.rank(&IntentAnalysis::new("browse"), &session(), &profile))
        .unwrap();
    assert_eq!(ranked[0].item, ItemRef::Component("ProductCard".into()));
    assert!(ranked[0].signals.recency > 0.9);
}

// ── Degradation ──────────────────────────────────────────────────────────

#[test]
fn unknown_hits_are_dropped() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let hits = vec![
        SearchHit { item: ItemRef::Component("Ghost".into()), similarity: 0.99 },
        SearchHit { item: ItemRef::Component("ProductCard".into()), similarity: 0.3 },
    ];
    let ranker = Ranker::new(fixture_catalog(), Arc::new(StaticIndex(hits)), RankingConfig::default());
    let ranked = rt
        .block_on(ranker.rank(&IntentAnalysis::new("browse"), &session(), &profile()))
        .unwrap();
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].item.name(), "ProductCard");
}

#[test]
fn no_hits_degrades_to_whole_catalog() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ranker = Ranker::new(fixture_catalog(), Arc::new(StaticIndex(Vec::new())), RankingConfig::default());
    let ranked = rt.block_on(ranker.rank(&booking(), &session(), &profile())).unwrap();

    assert_eq!(ranked.len(), RankingConfig::default().top_k);
    assert!(ranked.iter().all(|c| c.signals.similarity == 0.0));
    assert_eq!(ranked[0].item, ItemRef::Component("BookingForm".into()));
}

#[test]
fn offline_ranking_matches_degraded_ranking() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ranker = Ranker::new(fixture_catalog(), Arc::new(StaticIndex(Vec::new())), RankingConfig::default());
    let now = Utc::now();
    let degraded = rt.block_on(ranker.rank(&booking(), &session(), &profile())).unwrap();
    let offline = ranker.rank_offline_at(&booking(), &profile(), now).unwrap();
    let degraded_items: Vec<_> = degraded.iter().map(|c| c.item.clone()).collect();
    let offline_items: Vec<_> = offline.iter().map(|c| c.item.clone()).collect();
    assert_eq!(degraded_items, offline_items);
}

#[test]
fn index_failure_propagates_as_unavailable() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ranker = Ranker::new(fixture_catalog(), Arc::new(BrokenIndex), RankingConfig::default());
    let err = rt.block_on(ranker.rank(&booking(), &session(), &profile())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unavailable);
}

#[test]
fn empty_intent_is_invalid_input() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ranker = keyword_ranker(RankingConfig::default());
    let err = rt
        .block_on(ranker.rank(&IntentAnalysis::new("  "), &session(), &profile()))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

// ── Deadline ─────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn slow_index_times_out_at_the_deadline() {
    let ranker = Ranker::new(
        fixture_catalog(),
        Arc::new(SlowIndex),
        RankingConfig {
            deadline_ms: 250,
            ..RankingConfig::default()
        },
    );
    let err = ranker.rank(&booking(), &session(), &profile()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(err.triggers_fallback());
    match err {
        IntentLayerError::Timeout { elapsed_ms, .. } => assert!(elapsed_ms >= 250),
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn abandoned_rank_leaves_nothing_behind() {
    let ranker = Arc::new(Ranker::new(fixture_catalog(), Arc::new(SlowIndex), RankingConfig::default()));
    let task = {
        let ranker = Arc::clone(&ranker);
        tokio::spawn(async move { ranker.rank(&booking(), &session(), &profile()).await })
    };
    tokio::time::sleep(StdDuration::from_millis(10)).await;
    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());
    // The ranker is still usable afterwards.
    assert!(!ranker.rank_offline(&booking(), &profile()).unwrap().is_empty());
}
