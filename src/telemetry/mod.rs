//! Telemetry Ingress
//!
//! Receives fixed-layout binary records from the tracking process over UDP
//! and hands each decoded sample to the subscriber hub.
//!
//! - **record**: [`TelemetrySample`] and its 24-byte wire codec
//! - **ingress**: [`IngressListener`], the receive loop and its counters

mod error;
mod ingress;
mod record;

pub use error::{TelemetryError, TelemetryResult};
pub use ingress::{IngressConfig, IngressListener, IngressStats, IngressStatsSnapshot};
pub use record::{TelemetrySample, RECORD_LEN};
