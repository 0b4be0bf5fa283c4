//! Periodic sweep of overdue loans and lapsed holds

use std::time::Duration;

use tokio::{sync::watch, time};

use crate::repository::LendingStore;

use super::lending::LendingCoordinator;

/// Runs [`LendingCoordinator::sweep`] on a fixed interval
pub struct LendingSweeper<S: LendingStore> {
    lending: LendingCoordinator<S>,
    interval: Duration,
}

impl<S: LendingStore> LendingSweeper<S> {
    pub fn new(lending: LendingCoordinator<S>, interval_seconds: u64) -> Self {
        Self {
            lending,
            interval: Duration::from_secs(interval_seconds.max(1)),
        }
    }

    /// Sweep loop; returns once `shutdown` flips to `true`
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            "Lending sweeper started, interval={}s",
            self.interval.as_secs()
        );

        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.lending.sweep().await {
                        Ok(report) => tracing::trace!(?report, "Lending sweep done"),
                        Err(e) => tracing::error!("Lending sweep failed: {}", e),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Lending sweeper shutting down");
                        break;
                    }
                }
            }
        }
    }
}
