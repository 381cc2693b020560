//! IntentLayerEngine: owns every subsystem and runs the turn pipeline.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;

use intentlayer_catalog::{KeywordIndex, TemplateCatalog};
use intentlayer_composer::Composer;
use intentlayer_core::config::IntentLayerConfig;
use intentlayer_core::constants::ACTIVE_USER_WINDOW_DAYS;
use intentlayer_core::errors::{ErrorKind, IntentLayerResult};
use intentlayer_core::models::{
    GlobalStatsSnapshot, IntentAnalysis, Interaction, RankedCandidate, Session, UIDescription,
    UserProfile, ValueMap,
};
use intentlayer_core::traits::{IKnowledgeIndex, IPersistence};
use intentlayer_observability::{DegradationEvent, ObservabilityEngine, RankLogEntry};
use intentlayer_recorder::{GlobalStats, Recorder};
use intentlayer_retrieval::Ranker;
use intentlayer_session::{HistoryMatch, MemoryStats, SessionAnalytics, SessionCreated, SessionStore};
use intentlayer_storage::StorageEngine;

use crate::fallback_cache::FallbackCache;

const RANKER_COMPONENT: &str = "ranker";

/// Where the UI of a turn came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UiSource {
    /// Fresh ranking within the deadline.
    Ranked,
    /// Last UI composed for the same user and intent, refitted to this turn
    /// and served after a timeout.
    Cached,
    /// Catalog-only ranking, served after a timeout with nothing cached.
    Offline,
}

impl UiSource {
    fn fallback_label(self) -> Option<String> {
        match self {
            Self::Ranked => None,
            Self::Cached => Some("cached_ui".to_string()),
            Self::Offline => Some("offline_rank".to_string()),
        }
    }
}

/// Output of [`IntentLayerEngine::generate_ui`].
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedUi {
    pub ui: UIDescription,
    /// Candidates the UI was composed from. Empty when served from cache.
    pub candidates: Vec<RankedCandidate>,
    pub source: UiSource,
}

impl GeneratedUi {
    /// Relevance recorded for the turn: the primary component's composite score.
    pub fn relevance(&self) -> f64 {
        self.ui.primary_score()
    }
}

/// Output of [`IntentLayerEngine::process_turn`].
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub generated: GeneratedUi,
    pub interaction: Interaction,
}

/// The IntentLayer engine.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
pub struct IntentLayerEngine {
    pub(crate) config: IntentLayerConfig,
    catalog: Arc<TemplateCatalog>,
    pub(crate) store: Arc<SessionStore>,
    ranker: Ranker,
    composer: Composer,
    recorder: Recorder,
    pub(crate) stats: Arc<GlobalStats>,
    pub(crate) persistence: Option<Arc<dyn IPersistence>>,
    fallback: FallbackCache,
    pub(crate) observability: Mutex<ObservabilityEngine>,
}

impl IntentLayerEngine {
    /// Open storage, load the catalog, restore persisted state and build the keyword index.
    pub fn open(config: IntentLayerConfig) -> IntentLayerResult<Self> {
        let catalog = Arc::new(load_catalog(&config)?);
        let index: Arc<dyn IKnowledgeIndex> = Arc::new(KeywordIndex::build(&catalog));
        let persistence = open_storage(&config)?;
        Self::assemble(config, catalog, index, persistence)
    }

    /// Like [`open`](Self::open), with a caller-supplied knowledge index and persistence.
    pub fn with_parts(
        config: IntentLayerConfig,
        catalog: TemplateCatalog,
        index: Arc<dyn IKnowledgeIndex>,
        persistence: Option<Arc<dyn IPersistence>>,
    ) -> IntentLayerResult<Self> {
        Self::assemble(config, Arc::new(catalog), index, persistence)
    }

    fn assemble(
        config: IntentLayerConfig,
        catalog: Arc<TemplateCatalog>,
        index: Arc<dyn IKnowledgeIndex>,
        persistence: Option<Arc<dyn IPersistence>>,
    ) -> IntentLayerResult<Self> {
        config.validate()?;

        let store = Arc::new(match &persistence {
            Some(p) => SessionStore::with_persistence(config.session.clone(), Arc::clone(p)),
            None => SessionStore::new(config.session.clone()),
        });

        let stats = match &persistence {
            Some(p) => {
                let users = p.load_users(config.session.max_history_per_user)?;
                let sessions = p.load_sessions()?;
                store.restore(users, sessions)?;
                match p.load_global_stats()? {
                    Some(snapshot) => GlobalStats::from_snapshot(&snapshot, config.recorder.stats_top_k),
                    None => GlobalStats::new(config.recorder.stats_top_k),
                }
            }
            None => GlobalStats::new(config.recorder.stats_top_k),
        };
        let stats = Arc::new(stats);

        let ranker = Ranker::new(Arc::clone(&catalog), index, config.ranking.clone());
        let composer = Composer::new(Arc::clone(&catalog), config.composer.clone());
        let recorder = Recorder::new(Arc::clone(&store), Arc::clone(&stats), config.recorder.clone());
        let fallback = FallbackCache::new(
            config.storage.fallback_cache_capacity,
            config.storage.fallback_cache_ttl(),
        );

        tracing::info!(
            catalog_version = catalog.version(),
            catalog_entries = catalog.len(),
            users = store.user_count(),
            sessions = store.session_count(),
            durable = persistence.is_some(),
            "intentlayer engine ready"
        );

        Ok(Self {
            config,
            catalog,
            store,
            ranker,
            composer,
            recorder,
            stats,
            persistence,
            fallback,
            observability: Mutex::new(ObservabilityEngine::new()),
        })
    }

    pub fn config(&self) -> &IntentLayerConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<TemplateCatalog> {
        &self.catalog
    }

    pub fn fallback_cache(&self) -> &FallbackCache {
        &self.fallback
    }

    /// Apply `f` to the observability state. A poisoned lock skips the update.
    pub(crate) fn observe(&self, f: impl FnOnce(&mut ObservabilityEngine)) {
        match self.observability.lock() {
            Ok(mut obs) => f(&mut obs),
            Err(_) => tracing::warn!("observability lock poisoned, dropping update"),
        }
    }

    // --- Sessions & users ---

    pub fn create_session(&self, user_id: &str, user_data: ValueMap) -> IntentLayerResult<SessionCreated> {
        let created = self.store.create_session(user_id, user_data)?;
        self.stats.record_session(created.new_user);
        let evicted = created.evicted.len() as u64;
        self.observe(|obs| {
            obs.metrics.sessions_created += 1;
            obs.metrics.sessions_evicted += evicted;
        });
        Ok(created)
    }

    pub fn get_session(&self, session_id: &str) -> IntentLayerResult<Session> {
        self.store.get_session(session_id)
    }

    /// Active sessions of a user, oldest first.
    pub fn list_sessions(&self, user_id: &str) -> IntentLayerResult<Vec<Session>> {
        self.store.list_sessions(user_id)
    }

    pub fn delete_session(&self, session_id: &str) -> IntentLayerResult<bool> {
        self.store.delete_session(session_id)
    }

    pub fn user_profile(&self, user_id: &str) -> IntentLayerResult<UserProfile> {
        self.store.user_profile(user_id)
    }

    pub fn update_preferences(&self, user_id: &str, preferences: &ValueMap) -> IntentLayerResult<UserProfile> {
        self.store.update_preferences(user_id, preferences)
    }

    pub fn delete_user(&self, user_id: &str) -> IntentLayerResult<bool> {
        let removed = self.store.delete_user(user_id)?;
        if removed {
            self.stats.record_user_removed();
        }
        Ok(removed)
    }

    // --- Memory queries ---

    pub fn user_context(
        &self,
        user_id: &str,
        session_id: Option<&str>,
        limit: usize,
    ) -> IntentLayerResult<Vec<Interaction>> {
        self.store.user_context(user_id, session_id, limit)
    }

    pub fn search_history(&self, user_id: &str, query: &str, limit: usize) -> IntentLayerResult<Vec<HistoryMatch>> {
        self.store.search_history(user_id, query, limit)
    }

    pub fn memory_stats(&self) -> IntentLayerResult<MemoryStats> {
        self.store
            .memory_stats(Utc::now(), chrono::Duration::days(ACTIVE_USER_WINDOW_DAYS))
    }

    pub fn session_analytics(&self, session_id: &str) -> Option<SessionAnalytics> {
        self.store.analytics(session_id)
    }

    pub fn global_stats(&self) -> GlobalStatsSnapshot {
        self.stats.snapshot()
    }

    /// Engine counters and rank-log summary as JSON.
    pub fn metrics_snapshot(&self) -> IntentLayerResult<serde_json::Value> {
        let mut snapshot = match self.observability.lock() {
            Ok(obs) => obs.metrics_snapshot()?,
            Err(_) => serde_json::json!({}),
        };
        if let Some(map) = snapshot.as_object_mut() {
            map.insert("fallback_cache_hit_rate".into(), self.fallback.hit_rate().into());
        }
        Ok(snapshot)
    }

    // --- Turns ---

    /// Rank and compose a UI for one turn without recording it.
    ///
    /// Session and profile are snapshotted first; no lock is held while the
    /// index runs. A `Timeout` from the ranker is absorbed by the fallback
    /// path. `Exhausted` and every other error reach the caller.
    pub async fn generate_ui(&self, session_id: &str, analysis: &IntentAnalysis) -> IntentLayerResult<GeneratedUi> {
        analysis.validate()?;
        let session = self.store.get_session(session_id)?;
        let profile = self.store.user_profile(&session.user_id)?;

        let started = Instant::now();
        let outcome = match self.ranker.rank(analysis, &session, &profile).await {
            Ok(candidates) => {
                self.observe(|obs| obs.mark_recovered(RANKER_COMPONENT));
                self.compose(candidates, analysis, &profile, UiSource::Ranked)
            }
            Err(err) if err.triggers_fallback() => {
                self.observe(|obs| obs.metrics.rank_timeouts += 1);
                self.fallback_ui(analysis, &profile, &err.to_string())
            }
            Err(err) => Err(err),
        };
        let latency = started.elapsed();

        let generated = match outcome {
            Ok(generated) => generated,
            Err(err) => {
                if err.kind() == ErrorKind::Exhausted {
                    self.observe(|obs| obs.metrics.exhausted += 1);
                }
                return Err(err);
            }
        };

        if generated.source == UiSource::Ranked {
            self.fallback
                .insert(&profile.user_id, &analysis.intent, generated.ui.clone());
        }
        self.store
            .record_rank_latency(session_id, latency.as_secs_f64() * 1_000.0);
        let entry = RankLogEntry::new(
            session_id,
            analysis.intent.as_str(),
            latency,
            generated.candidates.len(),
            generated.source.fallback_label(),
        );
        self.observe(|obs| obs.record_rank(entry));
        Ok(generated)
    }

    /// [`generate_ui`](Self::generate_ui) followed by recording the turn.
    ///
    /// The turn is recorded only once a UI exists, so an abandoned or failed
    /// call leaves the session untouched.
    pub async fn process_turn(&self, session_id: &str, analysis: &IntentAnalysis) -> IntentLayerResult<TurnOutcome> {
        let result = self.run_turn(session_id, analysis).await;
        match &result {
            Ok(_) => self.observe(|obs| obs.metrics.turns_processed += 1),
            Err(err) => {
                tracing::warn!(session_id, intent = %analysis.intent, error = %err, "turn failed");
                self.observe(|obs| obs.metrics.turns_failed += 1);
            }
        }
        result
    }

    async fn run_turn(&self, session_id: &str, analysis: &IntentAnalysis) -> IntentLayerResult<TurnOutcome> {
        let generated = self.generate_ui(session_id, analysis).await?;
        let interaction = self
            .recorder
            .record(session_id, analysis, &generated.ui, generated.relevance())?;
        Ok(TurnOutcome {
            generated,
            interaction,
        })
    }

    fn compose(
        &self,
        candidates: Vec<RankedCandidate>,
        analysis: &IntentAnalysis,
        profile: &UserProfile,
        source: UiSource,
    ) -> IntentLayerResult<GeneratedUi> {
        let ui = self.composer.compose(&candidates, analysis, profile)?;
        Ok(GeneratedUi { ui, candidates, source })
    }

    fn fallback_ui(&self, analysis: &IntentAnalysis, profile: &UserProfile, failure: &str) -> IntentLayerResult<GeneratedUi> {
        let cached = self
            .fallback
            .get(&profile.user_id, &analysis.intent)
            .map(|earlier| self.composer.refit(&earlier, analysis, profile));
        match cached {
            Some(Ok(ui)) => {
                self.observe(|obs| {
                    obs.metrics.cache_fallbacks += 1;
                    obs.record_degradation(DegradationEvent::new(RANKER_COMPONENT, failure, "cached_ui"));
                });
                return Ok(GeneratedUi {
                    ui,
                    candidates: Vec::new(),
                    source: UiSource::Cached,
                });
            }
            Some(Err(err)) => {
                tracing::warn!(error = %err, intent = %analysis.intent, "cached ui unusable, ranking offline");
                self.fallback.invalidate(&profile.user_id, &analysis.intent);
            }
            None => {}
        }

        let candidates = self.ranker.rank_offline(analysis, profile)?;
        self.observe(|obs| {
            obs.metrics.offline_fallbacks += 1;
            obs.record_degradation(DegradationEvent::new(RANKER_COMPONENT, failure, "offline_rank"));
        });
        self.compose(candidates, analysis, profile, UiSource::Offline)
    }

    // --- Lifecycle ---

    /// Persist the current global statistics. No-op without storage.
    pub fn flush_stats(&self) -> IntentLayerResult<()> {
        if let Some(persistence) = &self.persistence {
            persistence.save_global_stats(&self.stats.snapshot())?;
            tracing::debug!(total_interactions = self.stats.total_interactions(), "global stats flushed");
        }
        Ok(())
    }

    /// Flush global statistics before the process exits.
    pub fn shutdown(&self) -> IntentLayerResult<()> {
        self.flush_stats()?;
        tracing::info!(
            total_sessions = self.stats.total_sessions(),
            total_interactions = self.stats.total_interactions(),
            "intentlayer engine shut down"
        );
        Ok(())
    }
}

fn load_catalog(config: &IntentLayerConfig) -> IntentLayerResult<TemplateCatalog> {
    let catalog = match &config.catalog.path {
        Some(path) => TemplateCatalog::load_dir(path)?,
        None => TemplateCatalog::builtin()?,
    };
    Ok(catalog)
}

fn open_storage(config: &IntentLayerConfig) -> IntentLayerResult<Option<Arc<dyn IPersistence>>> {
    let persistence: Option<Arc<dyn IPersistence>> = match &config.storage.path {
        Some(path) => Some(Arc::new(StorageEngine::open(path)?)),
        None => None,
    };
    Ok(persistence)
}
