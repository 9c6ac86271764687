//! Market Scheduler
//!
//! Drives [`Platform::tick`] on a fixed interval until told to stop.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, instrument};

use crate::server::platform::Platform;

/// Periodic market ticker.
pub struct Scheduler {
    platform: Arc<Platform>,
    tick_interval: Duration,
    shutdown_tx: broadcast::Sender<()>,
}

impl Scheduler {
    /// Ticker at the platform's configured interval.
    pub fn new(platform: Arc<Platform>) -> Self {
        let tick_interval = platform.config().tick_interval;
        Self::with_interval(platform, tick_interval)
    }

    /// Ticker at an explicit interval.
    pub fn with_interval(platform: Arc<Platform>, tick_interval: Duration) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            platform,
            tick_interval,
            shutdown_tx,
        }
    }

    /// Sender that stops the loop when signalled.
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Run on a background task.
    pub fn spawn(self) -> JoinHandle<u64> {
        tokio::spawn(async move { self.run().await })
    }

    /// Tick until shutdown. Returns the number of ticks run.
    #[instrument(skip(self), fields(interval_ms = self.tick_interval.as_millis() as u64))]
    pub async fn run(&self) -> u64 {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // First tick of a tokio interval completes immediately.
        ticker.tick().await;
        info!("Market scheduler started");

        let mut ticks = 0u64;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let _report = self.platform.tick().await;
                    ticks += 1;

                    #[cfg(feature = "debug-tracing")]
                    tracing::debug!(tick = _report.tick, bias = _report.bias, "Scheduled tick");
                }
                _ = shutdown_rx.recv() => {
                    info!(ticks, "Market scheduler stopped");
                    break;
                }
            }
        }
        ticks
    }
}
