use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use intentlayer_core::config::RecorderConfig;
use intentlayer_core::errors::{IntentLayerError, IntentLayerResult};
use intentlayer_core::models::{IntentAnalysis, Interaction, UIDescription};
use intentlayer_observability::record_span;
use intentlayer_session::SessionStore;

use crate::global_stats::GlobalStats;
use crate::summary;

/// Applies the outcome of a turn to the session, the user profile and the
/// global counters.
pub struct Recorder {
    store: Arc<SessionStore>,
    stats: Arc<GlobalStats>,
    config: RecorderConfig,
}

impl Recorder {
    pub fn new(store: Arc<SessionStore>, stats: Arc<GlobalStats>, config: RecorderConfig) -> Self {
        Self { store, stats, config }
    }

    pub fn stats(&self) -> &Arc<GlobalStats> {
        &self.stats
    }

    pub fn record(
        &self,
        session_id: &str,
        analysis: &IntentAnalysis,
        ui: &UIDescription,
        relevance_score: f64,
    ) -> IntentLayerResult<Interaction> {
        self.record_at(session_id, analysis, ui, relevance_score, Utc::now())
    }

    /// Build the interaction and commit it together with the updated profile.
    ///
    /// The window push, `interaction_count` increment, summary, activity level
    /// and category usage are applied under the session's lock as one write;
    /// global counters follow once it has succeeded.
    pub fn record_at(
        &self,
        session_id: &str,
        analysis: &IntentAnalysis,
        ui: &UIDescription,
        relevance_score: f64,
        now: DateTime<Utc>,
    ) -> IntentLayerResult<Interaction> {
        let _span = record_span!(session_id).entered();
        analysis.validate()?;
        if !relevance_score.is_finite() {
            return Err(IntentLayerError::invalid_input(format!(
                "relevance score must be finite, got {relevance_score}"
            )));
        }
        let relevance_score = relevance_score.clamp(0.0, 1.0);
        let ui_summary = ui.summary();
        let clause = summary::clause(&analysis.intent, &analysis.entities);

        let interaction = self.store.commit_turn(session_id, |session, profile| {
            let activity = profile.decayed_activity(now, self.config.activity_half_life_days);
            profile.activity_level = (activity + self.config.activity_increment).clamp(0.0, 1.0);
            profile.context_summary =
                summary::append_clause(&profile.context_summary, &clause, self.config.summary_max_chars);
            if now > profile.last_active {
                profile.last_active = now;
            }
            if relevance_score >= self.config.success_threshold {
                for category in &ui_summary.categories {
                    profile.category_usage.insert(category.clone(), now);
                }
            }

            Ok(Interaction {
                id: Uuid::new_v4().to_string(),
                timestamp: now,
                session_id: session.session_id.clone(),
                user_id: session.user_id.clone(),
                user_input: analysis.user_input.clone(),
                intent: analysis.intent.clone(),
                entities: analysis.entities.clone(),
                context: analysis.context.clone(),
                ui_generated: ui_summary.clone(),
                relevance_score,
            })
        })?;

        self.stats
            .record_interaction(&interaction.intent, &interaction.ui_generated.categories);
        self.store.record_turn_analytics(
            session_id,
            &interaction.intent,
            &interaction.ui_generated.components,
        );
        tracing::debug!(
            session_id,
            interaction_id = %interaction.id,
            intent = %interaction.intent,
            relevance_score,
            "interaction recorded"
        );
        Ok(interaction)
    }
}
