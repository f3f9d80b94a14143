//! Subscriber Hub
//!
//! Registry of live subscribers and the fan-out that feeds them.
//!
//! Each subscriber owns a bounded queue drained by its connection's writer
//! task. Fan-out only ever calls `try_send`, so a slow subscriber costs the
//! ingress loop nothing: when its queue is full (or its connection is gone)
//! it is evicted and the broadcast carries on with the rest.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::messages::ServerMessage;
use crate::session::StatusSnapshot;
use crate::telemetry::TelemetrySample;

/// Unique identifier for a subscriber
pub type SubscriberId = String;

/// Manages all subscribers and broadcasts to them
pub struct SubscriberHub {
    /// Active subscribers: SubscriberId → SubscriberHandle
    subscribers: RwLock<HashMap<SubscriberId, SubscriberHandle>>,
    config: HubConfig,
    /// Messages successfully enqueued
    delivered: AtomicU64,
    /// Subscribers evicted after a failed enqueue
    dropped: AtomicU64,
}

/// Configuration for the subscriber hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Maximum number of concurrent subscribers
    pub max_subscribers: usize,
    /// Capacity of each subscriber's outbound queue
    pub queue_capacity: usize,
    /// Upper bound on a single socket write
    pub send_timeout: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_subscribers: 1000,
            queue_capacity: 256,
            send_timeout: Duration::from_secs(2),
        }
    }
}

/// Hub-side end of a subscriber
pub struct SubscriberHandle {
    sender: mpsc::Sender<ServerMessage>,
    /// When the subscriber registered
    pub connected_at: DateTime<Utc>,
}

/// Connection-side end of a subscriber, returned by [`SubscriberHub::register`]
pub struct Subscription {
    pub id: SubscriberId,
    pub receiver: mpsc::Receiver<ServerMessage>,
}

/// Result of a single broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub dropped: usize,
}

/// Counters exposed on the health endpoint
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HubStats {
    pub subscribers: usize,
    pub delivered: u64,
    pub dropped: u64,
}

impl SubscriberHub {
    /// Create a new subscriber hub
    pub fn new(config: HubConfig) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            config,
            delivered: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Register a new subscriber
    ///
    /// Returns the subscriber's id and queue, or an error if the subscriber
    /// limit has been reached.
    pub async fn register(&self) -> Result<Subscription, HubError> {
        let mut subscribers = self.subscribers.write().await;
        if subscribers.len() >= self.config.max_subscribers {
            return Err(HubError::TooManySubscribers(self.config.max_subscribers));
        }

        let (sender, receiver) = mpsc::channel(self.config.queue_capacity.max(1));
        let id = Uuid::new_v4().to_string();
        subscribers.insert(
            id.clone(),
            SubscriberHandle {
                sender,
                connected_at: Utc::now(),
            },
        );
        drop(subscribers);

        tracing::info!(subscriber_id = %id, "Subscriber connected");
        Ok(Subscription { id, receiver })
    }

    /// Remove a subscriber. Returns false if it was already gone.
    pub async fn unregister(&self, id: &str) -> bool {
        let removed = self.subscribers.write().await.remove(id);

        if let Some(handle) = &removed {
            let connected_for = Utc::now() - handle.connected_at;
            tracing::info!(
                subscriber_id = %id,
                connected_secs = connected_for.num_seconds(),
                "Subscriber disconnected"
            );
        }
        removed.is_some()
    }

    /// Visit every current subscriber under a consistent read view
    pub async fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&SubscriberId, &SubscriberHandle),
    {
        let subscribers = self.subscribers.read().await;
        for (id, handle) in subscribers.iter() {
            f(id, handle);
        }
    }

    /// Enqueue `message` for every subscriber.
    ///
    /// Subscribers whose queue is full or closed are evicted; the rest
    /// still receive the message.
    pub async fn broadcast(&self, message: &ServerMessage) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        let mut failed: Vec<(SubscriberId, &'static str)> = Vec::new();

        self.for_each(|id, handle| match handle.sender.try_send(message.clone()) {
            Ok(()) => report.delivered += 1,
            Err(TrySendError::Full(_)) => failed.push((id.clone(), "queue full")),
            Err(TrySendError::Closed(_)) => failed.push((id.clone(), "connection closed")),
        })
        .await;

        for (id, reason) in failed {
            tracing::warn!(subscriber_id = %id, reason, "Dropping subscriber");
            if self.unregister(&id).await {
                report.dropped += 1;
            }
        }

        self.delivered
            .fetch_add(report.delivered as u64, Ordering::Relaxed);
        self.dropped.fetch_add(report.dropped as u64, Ordering::Relaxed);

        if report.delivered > 0 {
            tracing::trace!(subscribers = report.delivered, "Broadcast event");
        }
        report
    }

    /// Fan a decoded sample out as an `eye_tracking_data` event
    pub async fn publish_sample(&self, sample: &TelemetrySample) -> BroadcastReport {
        self.broadcast(&ServerMessage::sample(sample)).await
    }

    /// Send a message directly to a specific subscriber
    pub async fn send_to(&self, id: &str, message: ServerMessage) -> Result<(), HubError> {
        let subscribers = self.subscribers.read().await;
        let handle = subscribers.get(id).ok_or(HubError::SubscriberNotFound)?;

        handle
            .sender
            .try_send(message)
            .map_err(|_| HubError::SendFailed)
    }

    /// Relay session snapshots to every subscriber as `session_status`
    pub fn forward_session_status(
        self: Arc<Self>,
        mut status_rx: watch::Receiver<StatusSnapshot>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while status_rx.changed().await.is_ok() {
                let snapshot = status_rx.borrow_and_update().clone();
                self.broadcast(&ServerMessage::SessionStatus(snapshot)).await;
            }
            tracing::debug!("Session status channel closed");
        })
    }

    /// Get the current subscriber count
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    pub async fn stats(&self) -> HubStats {
        HubStats {
            subscribers: self.subscriber_count().await,
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Errors that can occur in the subscriber hub
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many subscribers (limit: {0})")]
    TooManySubscribers(usize),

    #[error("Subscriber not found")]
    SubscriberNotFound,

    #[error("Failed to send message")]
    SendFailed,

    #[error("Timed out sending message")]
    SendTimeout,
}
