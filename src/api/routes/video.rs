//! Video Proxy Route
//!
//! GET /video_feed - The tracking process's MJPEG stream, relayed chunk by
//! chunk. Only served while a session is starting or streaming.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// Carries the current stream id so clients can tell restarts apart
pub const STREAM_SESSION_HEADER: HeaderName = HeaderName::from_static("x-stream-session");

/// GET /video_feed
pub async fn video_feed(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let feed = state.session.video_feed().await?;

    let content_type = HeaderValue::from_str(&feed.stream.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    let mut response = Body::from_stream(feed.stream.body).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    if let Some(stream_id) = feed.stream_id {
        if let Ok(value) = HeaderValue::from_str(&stream_id.to_string()) {
            headers.insert(STREAM_SESSION_HEADER, value);
        }
    }

    Ok(response)
}
