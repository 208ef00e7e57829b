//! Scheduled and on-demand import runs.
//!
//! The [`ImportCoordinator`] owns the importer and a single-run guard.
//! Both entry points go through it:
//!
//! - [`trigger`](ImportCoordinator::trigger) runs one import now, or fails
//!   with [`IngestionError::ImportInProgress`] if one is already active.
//! - [`start`](ImportCoordinator::start) spawns a timer that triggers an
//!   import every interval. A tick that finds a run active is skipped.
//!
//! Runs execute on a blocking thread; the guard is held until the run
//! finishes even if the caller stops waiting for it.
//!
//! ```rust,ignore
//! let coordinator = ImportCoordinator::new(importer);
//! let handle = coordinator.start(Duration::from_secs(300));
//!
//! // ... serve requests, possibly calling coordinator.trigger() ...
//!
//! handle.stop().await;
//! ```

use crate::config::ImportMode;
use crate::error::IngestionError;
use crate::pipeline::{ImportReport, Importer};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Serializes import runs from the scheduler and manual triggers.
#[derive(Clone)]
pub struct ImportCoordinator {
    importer: Arc<Importer>,
    guard: Arc<Mutex<()>>,
}

impl ImportCoordinator {
    pub fn new(importer: Importer) -> Self {
        Self {
            importer: Arc::new(importer),
            guard: Arc::new(Mutex::new(())),
        }
    }

    pub fn importer(&self) -> &Importer {
        &self.importer
    }

    /// Whether a run currently holds the guard.
    pub fn is_running(&self) -> bool {
        self.guard.try_lock().is_err()
    }

    /// Run one import in the configured mode.
    pub async fn trigger(&self) -> Result<ImportReport, IngestionError> {
        self.trigger_mode(self.importer.config().mode).await
    }

    /// Run one import in `mode`.
    ///
    /// # Errors
    ///
    /// [`IngestionError::ImportInProgress`] if another run is active, or
    /// the run's own error.
    pub async fn trigger_mode(&self, mode: ImportMode) -> Result<ImportReport, IngestionError> {
        let permit = self
            .guard
            .clone()
            .try_lock_owned()
            .map_err(|_| IngestionError::ImportInProgress)?;
        let importer = self.importer.clone();

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            importer.run_mode(mode)
        })
        .await?
    }

    /// Trigger an import every `interval`, starting one interval from now.
    ///
    /// Missed ticks are skipped rather than replayed.
    pub fn start(&self, interval: Duration) -> ScheduleHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let coordinator = self.clone();

        tracing::info!(
            "Starting import scheduler (every {}s, dir {})",
            interval.as_secs(),
            self.importer.config().import_dir.display()
        );

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => match coordinator.trigger().await {
                        Ok(report) => tracing::info!(
                            "Scheduled import added {} rows",
                            report.rows_imported
                        ),
                        Err(IngestionError::ImportInProgress) => {
                            tracing::debug!("Scheduled import skipped: run in progress")
                        }
                        Err(e) => tracing::error!("Scheduled import failed: {}", e),
                    },
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });

        ScheduleHandle {
            stop_tx,
            task_handle: task,
        }
    }
}

/// Handle for controlling a running import scheduler.
pub struct ScheduleHandle {
    stop_tx: watch::Sender<bool>,
    task_handle: JoinHandle<()>,
}

impl ScheduleHandle {
    /// Stop the scheduler, waiting for an in-flight tick to finish.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        let _ = self.task_handle.await;
        tracing::info!("Import scheduler stopped");
    }

    /// Check if the scheduler task is still alive.
    pub fn is_running(&self) -> bool {
        !self.task_handle.is_finished()
    }
}
