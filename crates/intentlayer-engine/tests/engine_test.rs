//! End-to-end tests for the engine facade: turn pipeline, deadline fallback,
//! restart survival, maintenance, and the background task.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use intentlayer_catalog::{KeywordIndex, TemplateCatalog};
use intentlayer_core::config::IntentLayerConfig;
use intentlayer_core::models::*;
use intentlayer_core::traits::{IKnowledgeIndex, KnowledgeQuery};
use intentlayer_core::{ErrorKind, IntentLayerResult};
use intentlayer_engine::{IntentLayerEngine, UiSource};
use serde_json::json;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

fn config() -> IntentLayerConfig {
    let mut config = IntentLayerConfig::default();
    config.catalog.path = Some(test_fixtures::catalog_dir());
    config
}

fn fixture_catalog() -> TemplateCatalog {
    TemplateCatalog::load_dir(&test_fixtures::catalog_dir()).unwrap()
}

fn booking() -> IntentAnalysis {
    IntentAnalysis::new("booking_request")
        .with_entity("party_size", "4")
        .with_entity("time", "20h")
        .with_input("table for four at 8pm")
}

fn search() -> IntentAnalysis {
    IntentAnalysis::new("search_products").with_entity("query", "shoes")
}

/// Keyword index that can be switched to hang past any deadline.
struct SwitchableIndex {
    inner: KeywordIndex,
    slow: AtomicBool,
}

#[async_trait]
impl IKnowledgeIndex for SwitchableIndex {
    async fn search(&self, query: &KnowledgeQuery) -> IntentLayerResult<Vec<SearchHit>> {
        if self.slow.load(Ordering::SeqCst) {
            tokio::time::sleep(StdDuration::from_secs(60)).await;
        }
        Ok(self.inner.search_sync(query))
    }
    fn name(&self) -> &str {
        "switchable"
    }
}

fn switchable_engine() -> (IntentLayerEngine, Arc<SwitchableIndex>) {
    let catalog = fixture_catalog();
    let index = Arc::new(SwitchableIndex {
        inner: KeywordIndex::build(&catalog),
        slow: AtomicBool::new(false),
    });
    let engine = IntentLayerEngine::with_parts(config(), catalog, index.clone(), None).unwrap();
    (engine, index)
}

fn metric(engine: &IntentLayerEngine, name: &str) -> u64 {
    engine.metrics_snapshot().unwrap()["metrics"][name].as_u64().unwrap()
}

// ── Sessions ─────────────────────────────────────────────────────────────

#[test]
fn first_session_creates_a_default_profile() {
    let engine = IntentLayerEngine::open(config()).unwrap();
    let created = engine.create_session("u1", ValueMap::new()).unwrap();

    assert!(created.new_user);
    assert_eq!(created.session.interaction_count, 0);
    assert!(created.session.is_active);
    let profile = engine.user_profile("u1").unwrap();
    assert_eq!(profile.activity_level, UserProfile::new("u1", Utc::now()).activity_level);

    let stats = engine.global_stats();
    assert_eq!(stats.total_users, 1);
    assert_eq!(stats.total_sessions, 1);
    assert_eq!(metric(&engine, "sessions_created"), 1);
}

#[test]
fn session_cap_is_enforced_through_the_engine() {
    let mut config = config();
    config.session.max_sessions_per_user = 2;
    let engine = IntentLayerEngine::open(config).unwrap();

    let first = engine.create_session("u1", ValueMap::new()).unwrap();
    engine.create_session("u1", ValueMap::new()).unwrap();
    let third = engine.create_session("u1", ValueMap::new()).unwrap();

    assert_eq!(third.evicted, vec![first.session.session_id.clone()]);
    assert_eq!(engine.list_sessions("u1").unwrap().len(), 2);
    assert_eq!(engine.get_session(&first.session.session_id).unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(metric(&engine, "sessions_evicted"), 1);
    assert_eq!(engine.global_stats().total_users, 1);
}

#[test]
fn deleting_a_user_updates_totals() {
    let engine = IntentLayerEngine::open(config()).unwrap();
    engine.create_session("u1", ValueMap::new()).unwrap();
    engine.create_session("u2", ValueMap::new()).unwrap();

    assert!(engine.delete_user("u1").unwrap());
    assert!(!engine.delete_user("u1").unwrap());
    assert_eq!(engine.global_stats().total_users, 1);
    assert_eq!(engine.user_profile("u1").unwrap_err().kind(), ErrorKind::NotFound);
}

// ── Turn pipeline ────────────────────────────────────────────────────────

#[test]
fn booking_turn_composes_and_records() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        let engine = IntentLayerEngine::open(config()).unwrap();
        let mut prefs = ValueMap::new();
        prefs.insert("language".into(), json!("fr"));
        let sid = engine.create_session("u1", prefs).unwrap().session.session_id;

        let outcome = engine.process_turn(&sid, &booking()).await.unwrap();

        assert_eq!(outcome.generated.source, UiSource::Ranked);
        let primary = &outcome.generated.ui.components[0];
        assert_eq!(primary.template_name, "BookingForm");
        assert_eq!(primary.props["party_size"], json!("4"));
        assert_eq!(primary.props["language"], json!("fr"));
        assert_eq!(outcome.interaction.relevance_score, outcome.generated.relevance());

        let session = engine.get_session(&sid).unwrap();
        assert_eq!(session.interaction_count, 1);
        assert_eq!(session.window.len(), 1);
        assert_eq!(session.window[0].intent, "booking_request");

        let profile = engine.user_profile("u1").unwrap();
        assert!(profile.context_summary.contains("booking_request"));

        let stats = engine.global_stats();
        assert_eq!(stats.total_interactions, 1);
        assert_eq!(stats.intent_counts.get("booking_request"), Some(&1));

        let analytics = engine.session_analytics(&sid).unwrap();
        assert_eq!(analytics.intent_distribution.get("booking_request"), Some(&1));
        assert_eq!(metric(&engine, "turns_processed"), 1);
        assert_eq!(metric(&engine, "rank_calls"), 1);
    });
}

#[test]
fn identical_turns_generate_identical_ui() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        let engine = IntentLayerEngine::open(config()).unwrap();
        let sid = engine.create_session("u1", ValueMap::new()).unwrap().session.session_id;

        let first = engine.generate_ui(&sid, &search()).await.unwrap();
        let second = engine.generate_ui(&sid, &search()).await.unwrap();
        assert_eq!(first.ui, second.ui);
        assert_eq!(first.candidates, second.candidates);
        assert_eq!(engine.get_session(&sid).unwrap().interaction_count, 0, "generate_ui does not record");
    });
}

#[test]
fn unknown_or_expired_session_is_not_found() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        let engine = IntentLayerEngine::open(config()).unwrap();
        let err = engine.process_turn("missing", &booking()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let sid = engine.create_session("u1", ValueMap::new()).unwrap().session.session_id;
        assert!(engine.delete_session(&sid).unwrap());
        let err = engine.process_turn(&sid, &booking()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(metric(&engine, "turns_failed"), 2);
    });
}

#[test]
fn invalid_analysis_is_rejected_before_ranking() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        let engine = IntentLayerEngine::open(config()).unwrap();
        let sid = engine.create_session("u1", ValueMap::new()).unwrap().session.session_id;
        let err = engine.process_turn(&sid, &IntentAnalysis::new("  ")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(metric(&engine, "rank_calls"), 0);
    });
}

#[test]
fn empty_catalog_is_exhausted_and_records_nothing() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        let catalog = TemplateCatalog::empty();
        let index = Arc::new(KeywordIndex::build(&catalog));
        let engine = IntentLayerEngine::with_parts(config(), catalog, index, None).unwrap();
        let sid = engine.create_session("u1", ValueMap::new()).unwrap().session.session_id;

        let err = engine.process_turn(&sid, &booking()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Exhausted);
        assert_eq!(engine.get_session(&sid).unwrap().interaction_count, 0);
        assert_eq!(engine.global_stats().total_interactions, 0);
        assert_eq!(metric(&engine, "exhausted"), 1);
    });
}

/// Counts spans opened under one name.
struct SpanCounter {
    name: &'static str,
    opened: Arc<AtomicUsize>,
}

impl<S: tracing::Subscriber> Layer<S> for SpanCounter {
    fn on_new_span(&self, attrs: &tracing::span::Attributes<'_>, _: &tracing::span::Id, _: Context<'_, S>) {
        if attrs.metadata().name() == self.name {
            self.opened.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[test]
fn each_composition_opens_one_compose_span() {
    let opened = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(SpanCounter {
        name: "intentlayer.compose",
        opened: Arc::clone(&opened),
    });
    let engine = IntentLayerEngine::open(config()).unwrap();
    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();

    tracing::subscriber::with_default(subscriber, || {
        rt.block_on(async {
            let sid = engine.create_session("u1", ValueMap::new()).unwrap().session.session_id;
            engine.process_turn(&sid, &booking()).await.unwrap();
        })
    });

    assert_eq!(opened.load(Ordering::SeqCst), 1);
}

// ── Deadline fallback ────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn timeout_serves_the_cached_ui_for_the_intent() {
    let (engine, index) = switchable_engine();
    let sid = engine.create_session("u1", ValueMap::new()).unwrap().session.session_id;

    let fresh = engine.process_turn(&sid, &booking()).await.unwrap();
    assert_eq!(fresh.generated.source, UiSource::Ranked);

    index.slow.store(true, Ordering::SeqCst);
    let fallback = engine.process_turn(&sid, &booking()).await.unwrap();

    assert_eq!(fallback.generated.source, UiSource::Cached);
    assert_eq!(fallback.generated.ui, fresh.generated.ui);
    assert!(fallback.generated.candidates.is_empty());
    assert_eq!(engine.get_session(&sid).unwrap().interaction_count, 2);
    assert_eq!(metric(&engine, "rank_timeouts"), 1);
    assert_eq!(metric(&engine, "cache_fallbacks"), 1);
    assert_eq!(engine.fallback_cache().hits(), 1);
}

#[tokio::test(start_paused = true)]
async fn cached_ui_never_crosses_users_and_follows_the_current_turn() {
    let (engine, index) = switchable_engine();
    let alice_prefs: ValueMap = [("language".to_string(), json!("fr"))].into_iter().collect();
    let alice = engine.create_session("alice", alice_prefs).unwrap().session.session_id;
    let bob = engine.create_session("bob", ValueMap::new()).unwrap().session.session_id;

    engine.process_turn(&alice, &booking()).await.unwrap();
    index.slow.store(true, Ordering::SeqCst);

    let bob_turn = IntentAnalysis::new("booking_request")
        .with_entity("party_size", "2")
        .with_entity("time", "12h");
    let for_bob = engine.process_turn(&bob, &bob_turn).await.unwrap();
    assert_eq!(for_bob.generated.source, UiSource::Offline);
    for component in &for_bob.generated.ui.components {
        assert_ne!(component.props.get("language"), Some(&json!("fr")));
        assert_ne!(component.props.get("party_size"), Some(&json!("4")));
        assert_ne!(component.props.get("time"), Some(&json!("20h")));
    }

    let alice_again = IntentAnalysis::new("booking_request").with_entity("party_size", "6");
    let for_alice = engine.process_turn(&alice, &alice_again).await.unwrap();
    assert_eq!(for_alice.generated.source, UiSource::Cached);
    let primary = &for_alice.generated.ui.components[0];
    assert_eq!(primary.template_name, "BookingForm");
    assert_eq!(primary.props["party_size"], json!("6"));
    assert_eq!(primary.props["language"], json!("fr"));
    assert_ne!(primary.props["time"], json!("20h"));
}

#[tokio::test(start_paused = true)]
async fn timeout_without_cache_uses_offline_ranking() {
    let (engine, index) = switchable_engine();
    let sid = engine.create_session("u1", ValueMap::new()).unwrap().session.session_id;
    index.slow.store(true, Ordering::SeqCst);

    let outcome = engine.process_turn(&sid, &search()).await.unwrap();

    assert_eq!(outcome.generated.source, UiSource::Offline);
    assert!(!outcome.generated.ui.components.is_empty());
    assert!(outcome.generated.candidates.iter().all(|c| c.signals.similarity == 0.0));
    assert_eq!(metric(&engine, "offline_fallbacks"), 1);

    let snapshot = engine.metrics_snapshot().unwrap();
    assert_eq!(snapshot["active_degradations"], json!(1));

    // Recovery clears the degradation.
    index.slow.store(false, Ordering::SeqCst);
    let recovered = engine.process_turn(&sid, &search()).await.unwrap();
    assert_eq!(recovered.generated.source, UiSource::Ranked);
    assert_eq!(engine.metrics_snapshot().unwrap()["active_degradations"], json!(0));
}

#[tokio::test(start_paused = true)]
async fn abandoned_turn_leaves_the_session_untouched() {
    let (engine, index) = switchable_engine();
    let sid = engine.create_session("u1", ValueMap::new()).unwrap().session.session_id;
    index.slow.store(true, Ordering::SeqCst);

    // The caller gives up well before the rank deadline.
    let abandoned = tokio::time::timeout(StdDuration::from_millis(100), engine.process_turn(&sid, &booking())).await;
    assert!(abandoned.is_err());

    let session = engine.get_session(&sid).unwrap();
    assert_eq!(session.interaction_count, 0);
    assert!(session.window.is_empty());
    assert_eq!(engine.global_stats().total_interactions, 0);
}

// ── Persistence ──────────────────────────────────────────────────────────

#[test]
fn state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config();
    config.storage.path = Some(dir.path().join("intentlayer.db"));
    let rt = tokio::runtime::Runtime::new().unwrap();

    let sid = rt.block_on(async {
        let engine = IntentLayerEngine::open(config.clone()).unwrap();
        let sid = engine.create_session("u1", ValueMap::new()).unwrap().session.session_id;
        engine.process_turn(&sid, &booking()).await.unwrap();
        engine.process_turn(&sid, &search()).await.unwrap();
        engine.shutdown().unwrap();
        sid
    });

    let engine = IntentLayerEngine::open(config).unwrap();
    let session = engine.get_session(&sid).unwrap();
    assert_eq!(session.interaction_count, 2);
    assert_eq!(session.window.len(), 2);
    assert_eq!(session.window[1].intent, "search_products");

    let profile = engine.user_profile("u1").unwrap();
    assert!(profile.context_summary.contains("booking_request"));
    assert!(profile.context_summary.contains("search_products"));

    let stats = engine.global_stats();
    assert_eq!(stats.total_users, 1);
    assert_eq!(stats.total_interactions, 2);
    assert_eq!(engine.search_history("u1", "shoes", 5).unwrap().len(), 1);
}

// ── Maintenance ──────────────────────────────────────────────────────────

#[test]
fn maintenance_expires_then_purges_idle_sessions() {
    let engine = IntentLayerEngine::open(config()).unwrap();
    let sid = engine.create_session("u1", ValueMap::new()).unwrap().session.session_id;
    let session_config = &engine.config().session;

    let later = Utc::now() + session_config.idle_timeout() + Duration::seconds(1);
    let report = engine.run_maintenance_at(later).unwrap();
    assert_eq!(report.sessions_expired, 1);
    assert_eq!(report.sessions_purged, 0);
    assert_eq!(engine.get_session(&sid).unwrap_err().kind(), ErrorKind::NotFound);

    let again = engine.run_maintenance_at(later).unwrap();
    assert_eq!(again.sessions_expired, 0, "expiry is idempotent");

    let much_later = later + session_config.inactive_purge_after() + Duration::seconds(1);
    let report = engine.run_maintenance_at(much_later).unwrap();
    assert_eq!(report.sessions_purged, 1);
    assert!(engine.list_sessions("u1").unwrap().is_empty());
    assert_eq!(metric(&engine, "maintenance_runs"), 3);
    assert_eq!(metric(&engine, "sessions_expired"), 1);
}

#[test]
fn maintenance_flushes_stats_to_storage() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config();
    config.storage.path = Some(dir.path().join("stats.db"));

    {
        let engine = IntentLayerEngine::open(config.clone()).unwrap();
        engine.create_session("u1", ValueMap::new()).unwrap();
        let report = engine.run_maintenance_once().unwrap();
        assert!(report.stats_flushed);
    }

    let engine = IntentLayerEngine::open(config).unwrap();
    assert_eq!(engine.global_stats().total_sessions, 1);
}

#[tokio::test(start_paused = true)]
async fn background_maintenance_runs_until_shutdown() {
    let mut config = config();
    config.session.maintenance_interval_secs = 1;
    let engine = Arc::new(IntentLayerEngine::open(config).unwrap());

    let handle = engine.spawn_maintenance();
    tokio::time::sleep(StdDuration::from_millis(3_500)).await;
    handle.shutdown().await;

    let runs = metric(&engine, "maintenance_runs");
    assert!(runs >= 3, "expected at least 3 cycles, got {runs}");

    tokio::time::sleep(StdDuration::from_secs(5)).await;
    assert_eq!(metric(&engine, "maintenance_runs"), runs, "no cycles after shutdown");
}
