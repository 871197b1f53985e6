//! Background maintenance for the revocation store.
//!
//! Revocation entries already die lazily (reads and writes ignore expired
//! entries), but without a periodic sweep a quiet store would hold dead
//! digests indefinitely. The sweeper prunes on an interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::error::Result;
use crate::revocation::RevocationStore;

/// Periodic pruning of expired revocation entries
pub struct RevocationSweeper {
    revocations: Arc<dyn RevocationStore>,
    handle: Option<JoinHandle<()>>,
}

impl RevocationSweeper {
    pub fn new(revocations: Arc<dyn RevocationStore>) -> Self {
        Self {
            revocations,
            handle: None,
        }
    }

    /// Start the background sweep task. A running sweeper is restarted.
    pub fn start(&mut self, interval: Duration) {
        self.stop();

        let revocations = Arc::clone(&self.revocations);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                match revocations.prune().await {
                    Ok(pruned) => {
                        if pruned > 0 {
                            info!(pruned, "pruned expired revocation entries");
                        }
                    }
                    Err(e) => error!(error = %e, "revocation prune failed"),
                }
            }
        });
        self.handle = Some(handle);

        info!("revocation sweeper started");
    }

    /// Run a one-shot sweep (useful for CLI or tests)
    pub async fn run_once(revocations: &dyn RevocationStore) -> Result<usize> {
        revocations.prune().await
    }

    /// Stop the background task
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("revocation sweeper stopped");
        }
    }
}

impl Drop for RevocationSweeper {
    fn drop(&mut self) {
        self.stop();
    }
}
