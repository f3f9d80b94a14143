//! Tracking Process Integration
//!
//! The external tracking process owns the camera. It exposes an HTTP control
//! API (`/start`, `/stop`, `/status`) and an MJPEG `/video_feed`. The relay
//! talks to it through the [`Producer`] trait so the session controller can
//! be driven by a scripted producer in tests.

mod client;
#[cfg(test)]
pub(crate) mod mock;

pub use client::{HttpProducer, ProducerConfig};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use serde::Deserialize;

/// Control surface of the tracking process
#[async_trait]
pub trait Producer: Send + Sync {
    /// Ask the process to open the camera and begin tracking
    async fn start(&self) -> Result<(), ProducerError>;

    /// Ask the process to release the camera
    async fn stop(&self) -> Result<(), ProducerError>;

    /// Fetch the current counters
    async fn status(&self) -> Result<ProducerStatus, ProducerError>;

    /// Open the live video stream
    async fn video_feed(&self) -> Result<VideoStream, ProducerError>;
}

/// Body of the process's `GET /status`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProducerStatus {
    #[serde(default)]
    pub is_streaming: bool,
    #[serde(default)]
    pub total_blinks: u64,
}

/// A live media body plus its content type
pub struct VideoStream {
    /// e.g. `multipart/x-mixed-replace; boundary=frame`
    pub content_type: String,
    pub body: BoxStream<'static, Result<Bytes, ProducerError>>,
}

impl std::fmt::Debug for VideoStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoStream")
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Errors talking to the tracking process
#[derive(Debug, thiserror::Error)]
pub enum ProducerError {
    #[error("Tracking process unreachable: {0}")]
    Unreachable(String),

    #[error("Tracking process timed out")]
    Timeout,

    /// The process answered but refused the request
    #[error("Tracking process rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid response from tracking process: {0}")]
    InvalidResponse(String),

    #[error("Request error: {0}")]
    Request(#[source] reqwest::Error),
}

impl From<reqwest::Error> for ProducerError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProducerError::Timeout
        } else if e.is_connect() {
            ProducerError::Unreachable(e.to_string())
        } else if e.is_decode() {
            ProducerError::InvalidResponse(e.to_string())
        } else {
            ProducerError::Request(e)
        }
    }
}
