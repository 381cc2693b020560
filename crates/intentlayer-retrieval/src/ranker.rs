use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::Instrument;

use intentlayer_catalog::TemplateCatalog;
use intentlayer_core::config::RankingConfig;
use intentlayer_core::errors::{IntentLayerError, IntentLayerResult};
use intentlayer_core::models::{
    IntentAnalysis, ItemRef, MatchedSignals, RankedCandidate, SearchHit, Session, UserProfile,
};
use intentlayer_core::traits::IKnowledgeIndex;
use intentlayer_observability::rank_span;

use crate::query::RankQuery;
use crate::scorer;

/// Fuses index similarity with profile signals into an ordered candidate list.
///
/// Holds a snapshot of the catalog, so the set of resolvable items cannot
/// change during a call.
pub struct Ranker {
    catalog: Arc<TemplateCatalog>,
    index: Arc<dyn IKnowledgeIndex>,
    config: RankingConfig,
}

impl Ranker {
    pub fn new(catalog: Arc<TemplateCatalog>, index: Arc<dyn IKnowledgeIndex>, config: RankingConfig) -> Self {
        Self {
            catalog,
            index,
            config,
        }
    }

    pub fn catalog(&self) -> &Arc<TemplateCatalog> {
        &self.catalog
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    /// Rank catalog entries for one turn.
    ///
    /// `session` and `profile` are snapshots taken by the caller; no lock is
    /// held while the index is queried. Fails with `Exhausted` on an empty
    /// catalog and `Timeout` when the whole call exceeds the deadline.
    pub async fn rank(
        &self,
        analysis: &IntentAnalysis,
        session: &Session,
        profile: &UserProfile,
    ) -> IntentLayerResult<Vec<RankedCandidate>> {
        let deadline = self.config.deadline();
        let started = Instant::now();
        let ranking = self
            .rank_inner(analysis, session, profile, Utc::now())
            .instrument(rank_span!(session.session_id, analysis.intent));
        match tokio::time::timeout(deadline, ranking).await {
            Ok(result) => result,
            Err(_) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                tracing::warn!(
                    session_id = %session.session_id,
                    intent = %analysis.intent,
                    index = self.index.name(),
                    deadline_ms = self.config.deadline_ms,
                    "rank deadline exceeded"
                );
                Err(IntentLayerError::Timeout {
                    operation: "rank".to_string(),
                    elapsed_ms,
                })
            }
        }
    }

    async fn rank_inner(
        &self,
        analysis: &IntentAnalysis,
        session: &Session,
        profile: &UserProfile,
        now: DateTime<Utc>,
    ) -> IntentLayerResult<Vec<RankedCandidate>> {
        analysis.validate()?;
        self.ensure_not_empty()?;

        let query = RankQuery::build(analysis, session, self.config.history_turns);
        let hits = self
            .index
            .search(&query.to_knowledge_query(self.config.search_limit))
            .await?;

        let resolved = self.resolve_hits(hits);
        let pool = if resolved.is_empty() {
            tracing::warn!(
                intent = %analysis.intent,
                "index returned no usable hits, scoring the whole catalog"
            );
            self.catalog_pool()
        } else {
            resolved
        };
        Ok(self.score_pool(pool, analysis, profile, now))
    }

    /// Catalog-only ranking: every entry at similarity 0, scored on the
    /// remaining signals. Never touches the index.
    pub fn rank_offline(&self, analysis: &IntentAnalysis, profile: &UserProfile) -> IntentLayerResult<Vec<RankedCandidate>> {
        self.rank_offline_at(analysis, profile, Utc::now())
    }

    pub fn rank_offline_at(
        &self,
        analysis: &IntentAnalysis,
        profile: &UserProfile,
        now: DateTime<Utc>,
    ) -> IntentLayerResult<Vec<RankedCandidate>> {
        analysis.validate()?;
        self.ensure_not_empty()?;
        Ok(self.score_pool(self.catalog_pool(), analysis, profile, now))
    }

    fn ensure_not_empty(&self) -> IntentLayerResult<()> {
        if self.catalog.is_empty() {
            return Err(IntentLayerError::Exhausted {
                reason: "template catalog is empty".to_string(),
            });
        }
        Ok(())
    }

    fn catalog_pool(&self) -> BTreeMap<ItemRef, f64> {
        self.catalog.items().into_iter().map(|item| (item, 0.0)).collect()
    }

    /// Keep hits the catalog knows, best similarity per item, clamped to [0, 1].
    fn resolve_hits(&self, hits: Vec<SearchHit>) -> BTreeMap<ItemRef, f64> {
        let mut pool: BTreeMap<ItemRef, f64> = BTreeMap::new();
        for hit in hits {
            if !self.catalog.contains(&hit.item) {
                tracing::warn!(item = ?hit.item, index = self.index.name(), "dropping unknown item returned by index");
                continue;
            }
            let similarity = if hit.similarity.is_finite() {
                hit.similarity.clamp(0.0, 1.0)
            } else {
                0.0
            };
            let entry = pool.entry(hit.item).or_insert(similarity);
            *entry = entry.max(similarity);
        }
        pool
    }

    fn score_pool(
        &self,
        pool: BTreeMap<ItemRef, f64>,
        analysis: &IntentAnalysis,
        profile: &UserProfile,
        now: DateTime<Utc>,
    ) -> Vec<RankedCandidate> {
        let signal_tokens: BTreeSet<String> = analysis.signal_tokens().into_iter().collect();
        let mut ranked: Vec<RankedCandidate> = pool
            .into_iter()
            .map(|(item, similarity)| {
                let category = self.catalog.category_of(&item).unwrap_or_default();
                let (tag_overlap, matched_tags) =
                    scorer::tag_overlap(&signal_tokens, &self.catalog.keywords_of(&item));
                let signals = MatchedSignals {
                    similarity,
                    tag_overlap,
                    preference_affinity: scorer::preference_affinity(profile, category),
                    recency: scorer::recency_boost(profile, category, now, self.config.recency_half_life_hours),
                    matched_tags,
                };
                let score = scorer::composite(&self.config.weights, &signals);
                tracing::debug!(item = ?item, score, similarity, tag_overlap, "candidate scored");
                RankedCandidate { item, score, signals }
            })
            .collect();

        ranked.sort_by(candidate_order);
        ranked.truncate(self.config.top_k);
        ranked
    }
}

/// Score descending, then raw similarity descending, then name, then kind.
pub(crate) fn candidate_order(a: &RankedCandidate, b: &RankedCandidate) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| {
            b.signals
                .similarity
                .partial_cmp(&a.signals.similarity)
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| a.item.name().cmp(b.item.name()))
        .then_with(|| a.item.cmp(&b.item))
}
