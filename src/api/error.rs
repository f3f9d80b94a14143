//! API Error Types
//!
//! Defines error types for the API layer and implements conversion
//! to HTTP responses with appropriate status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::producer::ProducerError;
use crate::session::SessionError;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Rejected session action or failed producer call
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// HTTP status and machine-readable code
    pub fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Session(e) => match e {
                SessionError::AlreadyRunning => (StatusCode::CONFLICT, "ALREADY_RUNNING"),
                SessionError::NotRunning => (StatusCode::CONFLICT, "NOT_RUNNING"),
                SessionError::TransitionPending => (StatusCode::CONFLICT, "TRANSITION_PENDING"),
                SessionError::InvalidTransition { .. } => {
                    (StatusCode::CONFLICT, "INVALID_TRANSITION")
                }
                SessionError::NotStreaming => (StatusCode::CONFLICT, "NOT_STREAMING"),
                SessionError::Producer(ProducerError::Timeout) => {
                    (StatusCode::GATEWAY_TIMEOUT, "PRODUCER_TIMEOUT")
                }
                SessionError::Producer(ProducerError::Unreachable(_)) => {
                    (StatusCode::BAD_GATEWAY, "PRODUCER_UNREACHABLE")
                }
                SessionError::Producer(_) => (StatusCode::BAD_GATEWAY, "PRODUCER_ERROR"),
                SessionError::Interrupted(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
                }
            },
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always "error"
    pub status: &'static str,
    pub message: String,
    pub code: String,
    pub request_id: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.classify();
        let request_id = uuid::Uuid::new_v4().to_string();

        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "API error occurred"
            );
        } else {
            tracing::info!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            status: "error",
            message: self.to_string(),
            code: code.to_string(),
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
