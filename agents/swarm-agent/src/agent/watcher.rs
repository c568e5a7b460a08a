//! Reboot Watcher
//!
//! Polls for the fake reboot marker and cancels the agent's loop once it
//! appears.

use std::path::PathBuf;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Floor for the polling period; `tokio::time::interval` rejects zero
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

pub struct RebootWatcher {
    agent_id: i64,
    marker: Option<PathBuf>,
    interval: Duration,
}

impl RebootWatcher {
    pub fn new(agent_id: i64, marker: Option<PathBuf>, interval: Duration) -> Self {
        Self {
            agent_id,
            marker,
            interval: interval.max(MIN_POLL_INTERVAL),
        }
    }

    /// Whether the marker file exists
    ///
    /// An agent without a marker path never reboots.
    pub async fn reboot_happened(&self) -> bool {
        match &self.marker {
            Some(path) => tokio::fs::try_exists(path).await.unwrap_or(false),
            None => false,
        }
    }

    /// Poll until the marker appears or `cancel` fires
    ///
    /// Returns true when the marker was seen, in which case `cancel` has
    /// been triggered.
    pub async fn watch(self, cancel: CancellationToken) -> bool {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(agent_id = self.agent_id, "Reboot watcher stopped");
                    return false;
                }
                _ = ticker.tick() => {
                    if self.reboot_happened().await {
                        info!(agent_id = self.agent_id, "Reboot detected, stopping agent");
                        cancel.cancel();
                        return true;
                    }
                }
            }
        }
    }
}
