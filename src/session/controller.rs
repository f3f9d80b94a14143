//! Session Controller
//!
//! Owns the one [`StatusSnapshot`] (and with it the [`SessionState`]) for the
//! process. All mutations go through [`SessionController::apply`], which
//! holds the snapshot lock for the check-and-set of a single transition.
//! Producer calls happen outside the lock on a spawned task; the
//! transitional states `Starting`/`Stopping` mark a call in flight so
//! competing requests are rejected instead of queued.

use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

use super::error::{SessionError, SessionResult};
use super::state::{SessionAction, SessionState, StatusSnapshot};
use crate::producer::{Producer, ProducerError, VideoStream};

/// Serializes start/stop requests against the tracking process
pub struct SessionController {
    producer: Arc<dyn Producer>,
    snapshot: Mutex<StatusSnapshot>,
    /// Latest snapshot for push subscribers
    status_tx: watch::Sender<StatusSnapshot>,
}

/// A live video body tagged with the stream it belongs to
#[derive(Debug)]
pub struct VideoFeed {
    pub stream_id: Option<Uuid>,
    pub stream: VideoStream,
}

impl SessionController {
    pub fn new(producer: Arc<dyn Producer>) -> Self {
        let initial = StatusSnapshot::idle();
        let (status_tx, _) = watch::channel(initial.clone());

        Self {
            producer,
            snapshot: Mutex::new(initial),
            status_tx,
        }
    }

    /// Current state
    pub async fn state(&self) -> SessionState {
        self.snapshot.lock().await.state
    }

    /// Copy of the current snapshot
    pub async fn snapshot(&self) -> StatusSnapshot {
        self.snapshot.lock().await.clone()
    }

    /// Receive every snapshot change
    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.status_tx.subscribe()
    }

    /// Start the tracking process.
    ///
    /// `Idle → Starting`, then `Streaming` on acknowledgement or `Error` on
    /// failure. Fails with [`SessionError::AlreadyRunning`] outside of `Idle`,
    /// including while another start is pending.
    pub async fn start(self: &Arc<Self>) -> SessionResult<StatusSnapshot> {
        self.apply(SessionAction::Start, None).await?;

        self.complete(|producer| async move { producer.start().await })
            .await
    }

    /// Stop the tracking process.
    ///
    /// `Streaming → Stopping`, then `Idle` on acknowledgement or `Error` on
    /// failure.
    pub async fn stop(self: &Arc<Self>) -> SessionResult<StatusSnapshot> {
        self.apply(SessionAction::Stop, None).await?;

        self.complete(|producer| async move { producer.stop().await })
            .await
    }

    /// Run the producer call that closes a pending transition.
    ///
    /// The call runs on its own task so the session leaves `Starting` or
    /// `Stopping` even if the caller's future is dropped midway.
    async fn complete<F, Fut>(self: &Arc<Self>, call: F) -> SessionResult<StatusSnapshot>
    where
        F: FnOnce(Arc<dyn Producer>) -> Fut,
        Fut: Future<Output = Result<(), ProducerError>> + Send + 'static,
    {
        let this = Arc::clone(self);
        let request = call(Arc::clone(&self.producer));

        let task = tokio::spawn(async move {
            match request.await {
                Ok(()) => this.apply(SessionAction::ProducerAck, None).await,
                Err(e) => Err(this.fail(e).await),
            }
        });

        match task.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "Session transition task failed");
                Err(SessionError::Interrupted(e.to_string()))
            }
        }
    }

    /// Recover from `Error`
    pub async fn reset(&self) -> SessionResult<StatusSnapshot> {
        self.apply(SessionAction::Reset, None).await
    }

    /// Poll the producer's counters while streaming.
    ///
    /// Returns `Ok(None)` when not streaming. A failed poll leaves the
    /// snapshot untouched and is returned to the caller.
    pub async fn refresh_status(&self) -> SessionResult<Option<StatusSnapshot>> {
        if self.state().await != SessionState::Streaming {
            return Ok(None);
        }

        let status = self.producer.status().await?;

        let mut snapshot = self.snapshot.lock().await;
        // The session may have been stopped while the poll was in flight.
        if snapshot.state != SessionState::Streaming {
            return Ok(None);
        }

        if snapshot.total_blinks != status.total_blinks {
            snapshot.total_blinks = status.total_blinks;
            snapshot.updated_at = Utc::now();
            self.status_tx.send_replace(snapshot.clone());
        }

        if !status.is_streaming {
            tracing::warn!("Tracking process reports no active stream while session is streaming");
        }

        Ok(Some(snapshot.clone()))
    }

    /// Open the producer's video stream. Only valid in `Starting`/`Streaming`.
    pub async fn video_feed(&self) -> SessionResult<VideoFeed> {
        let (state, stream_id) = {
            let snapshot = self.snapshot.lock().await;
            (snapshot.state, snapshot.stream_id)
        };

        if !state.is_streaming() {
            return Err(SessionError::NotStreaming);
        }

        let stream = self.producer.video_feed().await?;
        Ok(VideoFeed { stream_id, stream })
    }

    /// Record a failed producer call and hand back the error for the caller
    async fn fail(&self, error: ProducerError) -> SessionError {
        let reason = error.to_string();
        if let Err(e) = self
            .apply(SessionAction::ProducerError, Some(reason.clone()))
            .await
        {
            tracing::error!(error = %e, "Failed to record producer error");
        }
        tracing::warn!(error = %reason, "Tracking process request failed");
        SessionError::Producer(error)
    }

    /// The single mutation point: validate and apply one transition
    async fn apply(
        &self,
        action: SessionAction,
        failure: Option<String>,
    ) -> SessionResult<StatusSnapshot> {
        let mut snapshot = self.snapshot.lock().await;
        let from = snapshot.state;
        let to = from.transition(action).map_err(|e| {
            tracing::debug!(state = %from, action = %action, error = %e, "Session action rejected");
            e
        })?;

        match (action, to) {
            (SessionAction::Start, _) => snapshot.last_error = None,
            (SessionAction::ProducerAck, SessionState::Streaming) => {
                snapshot.stream_id = Some(Uuid::new_v4());
            }
            (SessionAction::ProducerError, _) => {
                snapshot.last_error = failure;
                snapshot.stream_id = None;
            }
            (SessionAction::Reset, _) => snapshot.last_error = None,
            (_, SessionState::Idle) => snapshot.stream_id = None,
            _ => {}
        }

        snapshot.state = to;
        snapshot.is_streaming = to.is_streaming();
        snapshot.updated_at = Utc::now();

        tracing::info!(from = %from, to = %to, action = %action, "Session transition");

        self.status_tx.send_replace(snapshot.clone());
        Ok(snapshot.clone())
    }
}
