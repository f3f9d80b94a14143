//! Tracking Process REST Client
//!
//! HTTP client for the tracking process's control API.

use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt};
use reqwest::{header::CONTENT_TYPE, Client, Response};
use serde::Deserialize;
use std::time::Duration;

use super::{Producer, ProducerError, ProducerStatus, VideoStream};

/// HTTP implementation of [`Producer`]
pub struct HttpProducer {
    /// Client for short control calls (bounded by `request_timeout_ms`)
    client: Client,
    /// Client for the video stream (connect timeout only; the body never ends)
    stream_client: Client,
    config: ProducerConfig,
}

/// Configuration for the tracking process client
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    /// Base URL of the tracking process (e.g., "http://localhost:5000")
    pub base_url: String,
    /// Timeout for start/stop/status calls in milliseconds
    pub request_timeout_ms: u64,
    /// Connect timeout for the video stream in milliseconds
    pub connect_timeout_ms: u64,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            request_timeout_ms: 5000,
            connect_timeout_ms: 2000,
        }
    }
}

/// `{status, message}` body returned by `/start` and `/stop`
#[derive(Debug, Default, Deserialize)]
struct ControlReply {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl HttpProducer {
    pub fn new(config: ProducerConfig) -> Result<Self, ProducerError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(ProducerError::Request)?;

        let stream_client = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .build()
            .map_err(ProducerError::Request)?;

        Ok(Self {
            client,
            stream_client,
            config,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn control(&self, path: &str) -> Result<(), ProducerError> {
        let response = self.client.post(self.url(path)).send().await?;
        check_control_reply(response).await
    }
}

/// Treat a non-2xx status or an `{"status": "error"}` body as a rejection.
/// The process answers some refusals ("Stream already running") with 200.
async fn check_control_reply(response: Response) -> Result<(), ProducerError> {
    let status = response.status();
    let text = response.text().await?;
    let reply: ControlReply = serde_json::from_str(&text).unwrap_or_default();

    let refused = reply.status.as_deref() == Some("error");
    if status.is_success() && !refused {
        tracing::debug!(message = ?reply.message, "Tracking process accepted request");
        return Ok(());
    }

    let message = reply.message.unwrap_or_else(|| {
        if text.is_empty() {
            status.canonical_reason().unwrap_or("unknown error").to_string()
        } else {
            text
        }
    });

    Err(ProducerError::Rejected {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl Producer for HttpProducer {
    async fn start(&self) -> Result<(), ProducerError> {
        self.control("/start").await
    }

    async fn stop(&self) -> Result<(), ProducerError> {
        self.control("/stop").await
    }

    async fn status(&self) -> Result<ProducerStatus, ProducerError> {
        let response = self.client.get(self.url("/status")).send().await?;

        if !response.status().is_success() {
            return Err(ProducerError::Rejected {
                status: response.status().as_u16(),
                message: "status request failed".to_string(),
            });
        }

        Ok(response.json::<ProducerStatus>().await?)
    }

    async fn video_feed(&self) -> Result<VideoStream, ProducerError> {
        let response = self
            .stream_client
            .get(self.url("/video_feed"))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProducerError::Rejected {
                status: response.status().as_u16(),
                message: "video feed unavailable".to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("multipart/x-mixed-replace; boundary=frame")
            .to_string();

        let body = response
            .bytes_stream()
            .map_err(ProducerError::from)
            .boxed();

        Ok(VideoStream { content_type, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{header, StatusCode},
        response::IntoResponse,
        routing::{get, post},
        Json, Router,
    };
    use serde_json::json;

    /// Serve `router` on a loopback port, returning its base URL
    async fn spawn_fake_process(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn producer_for(base_url: String) -> HttpProducer {
        HttpProducer::new(ProducerConfig {
            base_url,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = ProducerConfig::default();
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.request_timeout_ms, 5000);
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let producer = HttpProducer::new(ProducerConfig {
            base_url: "http://localhost:5000/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(producer.url("/start"), "http://localhost:5000/start");
    }

    #[tokio::test]
    async fn test_unreachable_process() {
        // Bind then drop a listener to get a port nobody is serving.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let producer = HttpProducer::new(ProducerConfig {
            base_url: format!("http://127.0.0.1:{}", port),
            request_timeout_ms: 1000,
            connect_timeout_ms: 1000,
        })
        .unwrap();

        let err = producer.start().await.unwrap_err();
        assert!(
            matches!(err, ProducerError::Unreachable(_) | ProducerError::Timeout),
            "unexpected error: {:?}",
            err
        );
    }

    #[tokio::test]
    async fn test_start_accepted() {
        let router = Router::new().route(
            "/start",
            post(|| async { Json(json!({"status": "success", "message": "Stream started"})) }),
        );
        let producer = producer_for(spawn_fake_process(router).await);

        producer.start().await.unwrap();
    }

    #[tokio::test]
    async fn test_error_body_with_ok_status_is_rejection() {
        let router = Router::new().route(
            "/start",
            post(|| async {
                Json(json!({"status": "error", "message": "Stream already running"}))
            }),
        );
        let producer = producer_for(spawn_fake_process(router).await);

        match producer.start().await.unwrap_err() {
            ProducerError::Rejected { status, message } => {
                assert_eq!(status, 200);
                assert_eq!(message, "Stream already running");
            }
            other => panic!("Expected Rejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_carries_message() {
        let router = Router::new().route(
            "/stop",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"status": "error", "message": "Failed to open camera"})),
                )
            }),
        );
        let producer = producer_for(spawn_fake_process(router).await);

        match producer.stop().await.unwrap_err() {
            ProducerError::Rejected { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Failed to open camera");
            }
            other => panic!("Expected Rejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_status_parsed() {
        let router = Router::new().route(
            "/status",
            get(|| async { Json(json!({"isStreaming": true, "totalBlinks": 17})) }),
        );
        let producer = producer_for(spawn_fake_process(router).await);

        let status = producer.status().await.unwrap();
        assert!(status.is_streaming);
        assert_eq!(status.total_blinks, 17);
    }

    #[tokio::test]
    async fn test_video_feed_streams_body() {
        let router = Router::new().route(
            "/video_feed",
            get(|| async {
                (
                    [(header::CONTENT_TYPE, "multipart/x-mixed-replace; boundary=frame")],
                    "--frame\r\nContent-Type: image/jpeg\r\n\r\nJPEG\r\n",
                )
                    .into_response()
            }),
        );
        let producer = producer_for(spawn_fake_process(router).await);

        let mut video = producer.video_feed().await.unwrap();
        assert_eq!(video.content_type, "multipart/x-mixed-replace; boundary=frame");

        let mut body = Vec::new();
        while let Some(chunk) = video.body.next().await {
            body.extend_from_slice(&chunk.unwrap());
        }
        assert!(body.starts_with(b"--frame"));
    }
}
