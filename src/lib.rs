//! # Eyerelay
//!
//! Real-time relay between an eye-tracking process and browser dashboards.
//!
//! ## Features
//!
//! - **Telemetry ingress**: fixed 24-byte UDP records decoded and fanned out
//!   to every WebSocket subscriber in arrival order
//! - **Session control**: one state machine serializing start/stop of the
//!   tracking process, with status polling and push to subscribers
//! - **Control plane**: `/start`, `/stop`, `/status` and a streaming
//!   `/video_feed` proxy in front of the tracking process
//!
//! ## Modules
//!
//! - [`telemetry`]: Record decoding and the UDP ingress loop
//! - [`websocket`]: Subscriber hub and the real-time protocol
//! - [`session`]: Session state machine and status poller
//! - [`producer`]: Client for the tracking process
//! - [`api`]: HTTP server with Axum
//! - [`config`]: TOML and environment configuration
//!
//! ## Record format
//!
//! ```rust
//! use eyerelay::telemetry::{TelemetrySample, RECORD_LEN};
//!
//! let sample = TelemetrySample::new(1_700_000_000_000_000, 320, 240, 2, -1);
//! let bytes = sample.encode();
//! assert_eq!(bytes.len(), RECORD_LEN);
//! assert_eq!(TelemetrySample::decode(&bytes).unwrap(), sample);
//! ```

pub mod api;
pub mod config;
pub mod producer;
pub mod session;
pub mod telemetry;
pub mod websocket;

// Re-export top-level types for convenience
pub use telemetry::{
    IngressListener, IngressStats, TelemetryError, TelemetryResult, TelemetrySample, RECORD_LEN,
};

pub use session::{SessionController, SessionError, SessionState, StatusPoller, StatusSnapshot};

pub use producer::{HttpProducer, Producer, ProducerConfig, ProducerError};

pub use api::{build_router, serve, ApiError, AppState};

pub use websocket::{ClientMessage, HubError, ServerMessage, SubscriberHub, websocket_handler};

pub use config::{ApiConfig, Config, ConfigError, LoggingConfig};
