//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (ready to serve traffic)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::{HealthResponse, HubCounters};
use crate::api::state::AppState;
use crate::session::SessionState;

/// GET /health/live
///
/// Kubernetes liveness probe.
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Kubernetes readiness probe.
/// Returns 200 once the telemetry ingress socket is bound.
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    match state.ingress_addr {
        Some(_) => StatusCode::OK,
        None => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// GET /health
///
/// Full health status with relay counters.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let session_state = state.session.state().await;
    let hub = state.hub.stats().await;

    // The relay keeps serving in Error; only the session needs a reset.
    let status = if session_state == SessionState::Error || state.ingress_addr.is_none() {
        "degraded"
    } else {
        "healthy"
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        subscribers: hub.subscribers,
        session_state,
        ingress: state.ingress_stats.snapshot(),
        hub: HubCounters {
            delivered: hub.delivered,
            dropped: hub.dropped,
        },
    })
}
