//! Telemetry error types
//!
//! Errors raised while decoding datagrams and operating the ingress socket.

use std::net::SocketAddr;
use thiserror::Error;

/// Errors that can occur on the telemetry ingress path
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Datagram did not have the fixed record length
    #[error("Malformed record: expected {expected} bytes, got {len}")]
    MalformedRecord { len: usize, expected: usize },

    /// The ingress socket could not be bound (port in use, permission denied)
    #[error("Failed to bind UDP socket on {addr}: {source}")]
    BindFailure {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The configured bind address could not be parsed
    #[error("Invalid bind address {0}")]
    InvalidAddress(String),

    /// Socket I/O failed after bind
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TelemetryError {
    /// Build a bind failure for the given address
    pub fn bind_failure(addr: SocketAddr, source: std::io::Error) -> Self {
        TelemetryError::BindFailure {
            addr: addr.to_string(),
            source,
        }
    }
}

/// Result type alias for telemetry operations
pub type TelemetryResult<T> = Result<T, TelemetryError>;
