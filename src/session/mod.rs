//! Session Control
//!
//! Coordinates the tracking process's start/stop lifecycle.
//!
//! ```text
//! Idle ──start──▶ Starting ──ack──▶ Streaming ──stop──▶ Stopping ──ack──▶ Idle
//!                 Starting ──error─▶ Error              Stopping ──error─▶ Error
//! Error ──reset──▶ Idle
//! ```
//!
//! - **state**: [`SessionState`], the transition function and [`StatusSnapshot`]
//! - **controller**: [`SessionController`], the single owner of the state
//! - **poller**: [`StatusPoller`], refreshes counters while streaming

mod controller;
mod error;
mod poller;
mod state;

pub use controller::{SessionController, VideoFeed};
pub use error::{SessionError, SessionResult};
pub use poller::{PollOutcome, StatusPoller};
pub use state::{SessionAction, SessionState, StatusSnapshot};
