//! Session error types

use thiserror::Error;

use super::state::{SessionAction, SessionState};
use crate::producer::ProducerError;

/// Errors returned by the session controller
#[derive(Error, Debug)]
pub enum SessionError {
    /// `start()` outside of `Idle`
    #[error("Stream already running")]
    AlreadyRunning,

    /// `stop()` with no running stream
    #[error("No stream running")]
    NotRunning,

    /// `stop()` while a start request is still in flight
    #[error("A start request is still in progress")]
    TransitionPending,

    /// Any other action the current state does not accept
    #[error("Cannot {action} while {from}")]
    InvalidTransition {
        from: SessionState,
        action: SessionAction,
    },

    /// Video requested outside of `Starting`/`Streaming`
    #[error("No stream is active")]
    NotStreaming,

    /// The tracking process failed the request
    #[error("Tracking process error: {0}")]
    Producer(#[from] ProducerError),

    /// The task completing a start/stop ended without reporting back
    #[error("Session transition interrupted: {0}")]
    Interrupted(String),
}

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;
