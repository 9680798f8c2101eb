use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::ArtifactStore;

/// Periodic reclamation of expired artifacts
pub struct Sweeper;

impl Sweeper {
    /// Spawn the sweep loop
    ///
    /// The first sweep runs immediately so artifacts that expired while the
    /// process was down are reclaimed at startup. The loop ends when
    /// `shutdown` is cancelled.
    pub fn spawn(store: Arc<ArtifactStore>, interval: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(sweep_loop(store, interval, shutdown))
    }
}

async fn sweep_loop(store: Arc<ArtifactStore>, interval: Duration, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = shutdown.cancelled() => {
                tracing::debug!("artifact sweeper stopped");
                break;
            }
            _ = ticker.tick() => {
                if let Err(e) = store.sweep().await {
                    tracing::warn!(error = %e, "artifact sweep failed");
                }
            }
        }
    }
}
