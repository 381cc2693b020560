//! Background maintenance: idle expiry, purge, history retention, stats flush.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use intentlayer_core::errors::IntentLayerResult;
use intentlayer_observability::maintenance_span;
use intentlayer_session::PruneReport;

use crate::engine::IntentLayerEngine;

/// Outcome of one maintenance cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MaintenanceReport {
    pub sessions_expired: usize,
    pub sessions_purged: usize,
    pub history: PruneReport,
    pub stats_flushed: bool,
}

impl IntentLayerEngine {
    /// Run one maintenance cycle now.
    pub fn run_maintenance_once(&self) -> IntentLayerResult<MaintenanceReport> {
        self.run_maintenance_at(Utc::now())
    }

    /// Run one maintenance cycle as of `now`.
    ///
    /// Expiry runs before the purge, so a session idle past both thresholds
    /// is removed in the same cycle.
    pub fn run_maintenance_at(&self, now: DateTime<Utc>) -> IntentLayerResult<MaintenanceReport> {
        let cycle = self
            .observability
            .lock()
            .map(|obs| obs.metrics.maintenance_runs + 1)
            .unwrap_or_default();
        let _span = maintenance_span!(cycle).entered();
        let session = &self.config.session;

        let sessions_expired = self.store.expire_idle_sessions(session.idle_timeout(), now)?;
        let sessions_purged = self
            .store
            .purge_inactive_sessions(session.inactive_purge_after(), now)?;
        let history = self.store.prune_history(session.history_retention(), now)?;
        for _ in 0..history.users_removed {
            self.stats.record_user_removed();
        }
        self.flush_stats()?;

        let report = MaintenanceReport {
            sessions_expired,
            sessions_purged,
            history,
            stats_flushed: self.persistence.is_some(),
        };
        self.observe(|obs| {
            obs.metrics.maintenance_runs += 1;
            obs.metrics.sessions_expired += sessions_expired as u64;
            obs.metrics.sessions_purged += sessions_purged as u64;
        });
        tracing::debug!(?report, "maintenance cycle finished");
        Ok(report)
    }

    /// Start the periodic maintenance task on the current tokio runtime.
    ///
    /// Maintenance runs every `session.maintenance_interval_secs`; global
    /// statistics are also flushed every `storage.stats_flush_interval_secs`.
    /// The task stops when the returned handle is shut down.
    pub fn spawn_maintenance(self: &Arc<Self>) -> MaintenanceHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let engine = Arc::clone(self);
        let maintenance_every = Duration::from_secs(engine.config.session.maintenance_interval_secs.max(1));
        let flush_every = Duration::from_secs(engine.config.storage.stats_flush_interval_secs.max(1));

        let task = tokio::spawn(async move {
            let mut maintenance = tokio::time::interval(maintenance_every);
            let mut flush = tokio::time::interval(flush_every);
            maintenance.set_missed_tick_behavior(MissedTickBehavior::Delay);
            flush.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // Both intervals fire immediately; skip that first tick.
            maintenance.tick().await;
            flush.tick().await;

            loop {
                tokio::select! {
                    _ = maintenance.tick() => {
                        if let Err(err) = engine.run_maintenance_once() {
                            tracing::warn!(error = %err, "maintenance cycle failed");
                        }
                    }
                    _ = flush.tick() => {
                        if let Err(err) = engine.flush_stats() {
                            tracing::warn!(error = %err, "global stats flush failed");
                        }
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::info!("maintenance task stopped");
        });

        MaintenanceHandle { stop_tx, task }
    }
}

/// Handle to the background maintenance task.
pub struct MaintenanceHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl MaintenanceHandle {
    /// Signal the task to stop and wait for it.
    pub async fn shutdown(self) {
        // The receiver is gone only if the task already ended.
        let _ = self.stop_tx.send(true);
        if let Err(err) = self.task.await {
            tracing::warn!(error = %err, "maintenance task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
