//! Scripted producer for tests

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::oneshot;

use super::{Producer, ProducerError, ProducerStatus, VideoStream};

#[derive(Default)]
pub(crate) struct MockProducer {
    pub fail_start: AtomicBool,
    pub fail_stop: AtomicBool,
    pub fail_status: AtomicBool,
    pub total_blinks: AtomicU64,
    pub start_calls: AtomicUsize,
    pub stop_calls: AtomicUsize,
    hold: Mutex<Option<oneshot::Receiver<()>>>,
}

impl MockProducer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold the next start/stop call until the returned sender fires or drops
    pub fn hold_next(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.hold.lock().unwrap() = Some(rx);
        tx
    }

    async fn wait_if_held(&self) {
        let held = self.hold.lock().unwrap().take();
        if let Some(rx) = held {
            let _ = rx.await;
        }
    }

    fn unreachable() -> ProducerError {
        ProducerError::Unreachable("connection refused".to_string())
    }
}

#[async_trait]
impl Producer for MockProducer {
    async fn start(&self) -> Result<(), ProducerError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_if_held().await;
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(ProducerError::Rejected {
                status: 500,
                message: "Failed to open camera".to_string(),
            });
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), ProducerError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_if_held().await;
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err(Self::unreachable());
        }
        Ok(())
    }

    async fn status(&self) -> Result<ProducerStatus, ProducerError> {
        if self.fail_status.load(Ordering::SeqCst) {
            return Err(Self::unreachable());
        }
        Ok(ProducerStatus {
            is_streaming: true,
            total_blinks: self.total_blinks.load(Ordering::SeqCst),
        })
    }

    async fn video_feed(&self) -> Result<VideoStream, ProducerError> {
        let frames = vec![
            Ok(Bytes::from_static(b"--frame\r\nContent-Type: image/jpeg\r\n\r\n")),
            Ok(Bytes::from_static(b"JPEG\r\n")),
        ];
        Ok(VideoStream {
            content_type: "multipart/x-mixed-replace; boundary=frame".to_string(),
            body: futures_util::stream::iter(frames).boxed(),
        })
    }
}
