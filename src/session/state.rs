//! Session state machine
//!
//! The single process-wide [`SessionState`] and the transition function
//! that drives it. Every (state, action) pair has a defined outcome: either
//! the next state or a rejection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::SessionError;

/// Lifecycle of the external tracking process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Starting,
    Streaming,
    Stopping,
    Error,
}

/// Requests and producer outcomes that move the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionAction {
    /// Client asked to start tracking
    Start,
    /// Client asked to stop tracking
    Stop,
    /// The producer acknowledged the pending start or stop
    ProducerAck,
    /// The producer failed the pending start or stop
    ProducerError,
    /// Explicit recovery out of `Error`
    Reset,
}

impl SessionState {
    /// Compute the state that `action` leads to from `self`.
    pub fn transition(self, action: SessionAction) -> Result<SessionState, SessionError> {
        use SessionAction as A;
        use SessionState as S;

        match (self, action) {
            (S::Idle, A::Start) => Ok(S::Starting),
            (_, A::Start) => Err(SessionError::AlreadyRunning),

            (S::Streaming, A::Stop) => Ok(S::Stopping),
            (S::Starting, A::Stop) => Err(SessionError::TransitionPending),
            (_, A::Stop) => Err(SessionError::NotRunning),

            (S::Starting, A::ProducerAck) => Ok(S::Streaming),
            (S::Stopping, A::ProducerAck) => Ok(S::Idle),
            (S::Starting | S::Stopping, A::ProducerError) => Ok(S::Error),

            (S::Error, A::Reset) => Ok(S::Idle),

            (from, action) => Err(SessionError::InvalidTransition { from, action }),
        }
    }

    /// A video stream may be served in these states
    pub fn is_streaming(self) -> bool {
        matches!(self, SessionState::Starting | SessionState::Streaming)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Starting => "starting",
            SessionState::Streaming => "streaming",
            SessionState::Stopping => "stopping",
            SessionState::Error => "error",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for SessionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionAction::Start => "start",
            SessionAction::Stop => "stop",
            SessionAction::ProducerAck => "producer_ack",
            SessionAction::ProducerError => "producer_error",
            SessionAction::Reset => "reset",
        };
        f.write_str(name)
    }
}

/// Aggregated session status visible to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    /// Cumulative blink count reported by the producer
    pub total_blinks: u64,
    pub state: SessionState,
    /// True while a video stream can be served
    pub is_streaming: bool,
    /// Reason for the most recent failure that put the session in `Error`
    pub last_error: Option<String>,
    /// Identifier of the current stream, minted on each successful start
    pub stream_id: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl StatusSnapshot {
    pub fn idle() -> Self {
        Self {
            total_blinks: 0,
            state: SessionState::Idle,
            is_streaming: false,
            last_error: None,
            stream_id: None,
            updated_at: Utc::now(),
        }
    }
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self::idle()
    }
}
