// src/attempts/sweep.rs

use std::{sync::Arc, time::Duration};

use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};

use super::AttemptManager;

/// Owned handle to the background expiry sweep.
pub struct SweepHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweepHandle {
    /// Stops the sweep and waits for the task to finish its current tick.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::error!("Expiry sweep task failed: {}", e);
        }
    }
}

/// Spawns a task that calls `run_expiry_sweep` every `every`.
///
/// Store failures are logged and retried on the next tick.
pub fn spawn_expiry_sweep(manager: Arc<AttemptManager>, every: Duration) -> SweepHandle {
    // `interval` panics on a zero period.
    let every = every.max(Duration::from_millis(1));
    let (tx, mut rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; the first sweep runs one interval in.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match manager.run_expiry_sweep().await {
                        Ok(0) => {}
                        Ok(n) => tracing::debug!("Sweep expired {} sessions", n),
                        Err(e) => tracing::error!("Session expiry job failed: {}", e),
                    }
                }
                changed = rx.changed() => {
                    if changed.is_err() || *rx.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Expiry sweep stopped");
    });

    tracing::info!("Expiry sweep running every {:?}", every);
    SweepHandle { shutdown: tx, task }
}
