//! Data Transfer Objects
//!
//! Response types for the API endpoints.

use serde::Serialize;

use crate::session::{SessionState, StatusSnapshot};
use crate::telemetry::IngressStatsSnapshot;

// ============================================
// CONTROL DTOs
// ============================================

/// Response to `POST /start`, `/stop` and `/reset`
#[derive(Debug, Serialize)]
pub struct ControlResponse {
    /// Always "success"; failures use the error body
    pub status: String,
    pub message: String,
    /// Session after the action
    pub session: StatusSnapshot,
}

impl ControlResponse {
    pub fn success(message: impl Into<String>, session: StatusSnapshot) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            session,
        }
    }
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy" or "degraded"
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub subscribers: usize,
    pub session_state: SessionState,
    pub ingress: IngressStatsSnapshot,
    pub hub: HubCounters,
}

/// Fan-out counters
#[derive(Debug, Serialize)]
pub struct HubCounters {
    pub delivered: u64,
    pub dropped: u64,
}
