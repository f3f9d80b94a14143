//! Status Poller
//!
//! Periodically refreshes the session's counters from the tracking process.
//! Polls only while the session is `Streaming`; staleness is bounded by one
//! interval.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::controller::SessionController;

/// Outcome of one poll tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Session was not streaming
    Skipped,
    /// Snapshot refreshed
    Updated,
    /// Producer unreachable; last snapshot retained
    Failed,
}

/// Background task driving [`SessionController::refresh_status`]
pub struct StatusPoller {
    controller: Arc<SessionController>,
    interval: Duration,
}

impl StatusPoller {
    pub fn new(controller: Arc<SessionController>, interval: Duration) -> Self {
        Self {
            controller,
            interval,
        }
    }

    /// Spawn the polling loop. Runs until the handle is aborted.
    pub fn spawn(self) -> JoinHandle<()> {
        tracing::info!(
            interval_ms = self.interval.as_millis() as u64,
            "Starting status poller"
        );

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                self.poll_once().await;
            }
        })
    }

    /// Run a single poll
    pub async fn poll_once(&self) -> PollOutcome {
        match self.controller.refresh_status().await {
            Ok(Some(snapshot)) => {
                tracing::trace!(total_blinks = snapshot.total_blinks, "Status refreshed");
                PollOutcome::Updated
            }
            Ok(None) => PollOutcome::Skipped,
            Err(e) => {
                tracing::warn!(error = %e, "Status poll failed, keeping last snapshot");
                PollOutcome::Failed
            }
        }
    }
}
