//! The lifecycle reaper: a supervised background sweep that enforces a
//! hard time-to-live on rooms.
//!
//! Age counts from creation, not from last activity. A busy room past
//! the ceiling is removed like an idle one.

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{ReaperConfig, SharedRegistry};

/// Spawns and owns the sweep task.
pub struct Reaper;

impl Reaper {
    /// Starts sweeping `registry` every `config.interval`. The first sweep
    /// runs immediately.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(registry: SharedRegistry, config: ReaperConfig) -> ReaperHandle {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(registry, config, cancel.clone()));
        tracing::info!(
            max_age_secs = config.max_age.as_secs(),
            interval_secs = config.interval.as_secs(),
            "reaper started"
        );
        ReaperHandle { cancel, task }
    }

    /// One sweep. Returns how many rooms were removed.
    pub async fn sweep(registry: &SharedRegistry, config: &ReaperConfig) -> usize {
        let reaped = registry
            .lock()
            .await
            .reap_expired(config.max_age, Instant::now());
        if !reaped.is_empty() {
            tracing::info!(count = reaped.len(), rooms = ?reaped, "reaped expired rooms");
        }
        reaped.len()
    }
}

async fn run(registry: SharedRegistry, config: ReaperConfig, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(config.interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                Reaper::sweep(&registry, &config).await;
            }
        }
    }
    tracing::info!("reaper stopped");
}

/// Cancellation handle for a running reaper.
pub struct ReaperHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ReaperHandle {
    /// Stops the sweep and waits for the task to finish. A sweep already
    /// holding the registry lock completes first.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "reaper task failed");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
