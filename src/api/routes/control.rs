//! Session Control Routes
//!
//! - POST /start - Start the tracking process
//! - POST /stop - Stop the tracking process
//! - POST /reset - Recover from a failed start/stop
//! - GET /status - Current session snapshot

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::ControlResponse;
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::session::StatusSnapshot;

/// POST /start
pub async fn start(State(state): State<Arc<AppState>>) -> ApiResult<Json<ControlResponse>> {
    let session = state.session.start().await?;
    Ok(Json(ControlResponse::success("Stream started", session)))
}

/// POST /stop
pub async fn stop(State(state): State<Arc<AppState>>) -> ApiResult<Json<ControlResponse>> {
    let session = state.session.stop().await?;
    Ok(Json(ControlResponse::success("Stream stopped", session)))
}

/// POST /reset
pub async fn reset(State(state): State<Arc<AppState>>) -> ApiResult<Json<ControlResponse>> {
    let session = state.session.reset().await?;
    Ok(Json(ControlResponse::success("Session reset", session)))
}

/// GET /status
///
/// Served from the last snapshot; the poller keeps `totalBlinks` fresh.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusSnapshot> {
    Json(state.session.snapshot().await)
}
