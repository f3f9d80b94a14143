//! Datagram Ingress Listener
//!
//! Binds the telemetry UDP port once and runs the receive loop. Each
//! datagram is decoded and, on success, fanned out through the
//! [`SubscriberHub`] before the next one is read, which keeps samples in
//! arrival order for every subscriber. Malformed datagrams are counted and
//! dropped; nothing a sender does can stop the loop.

use serde::Serialize;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

use super::error::{TelemetryError, TelemetryResult};
use super::record::{TelemetrySample, RECORD_LEN};
use crate::websocket::SubscriberHub;

/// Ingress socket configuration
#[derive(Debug, Clone)]
pub struct IngressConfig {
    /// Host to bind to
    pub host: String,
    /// UDP port the tracking process sends to
    pub port: u16,
    /// Receive buffer size; datagrams longer than this are truncated (and
    /// then rejected as malformed)
    pub recv_buffer_size: usize,
}

impl Default for IngressConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7070,
            recv_buffer_size: 2048,
        }
    }
}

impl IngressConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Lock-free ingress counters
#[derive(Debug, Default)]
pub struct IngressStats {
    received: AtomicU64,
    forwarded: AtomicU64,
    malformed: AtomicU64,
    recv_errors: AtomicU64,
}

/// Point-in-time copy of [`IngressStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngressStatsSnapshot {
    pub received: u64,
    pub forwarded: u64,
    pub malformed: u64,
    pub recv_errors: u64,
}

impl IngressStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> IngressStatsSnapshot {
        IngressStatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            forwarded: self.forwarded.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            recv_errors: self.recv_errors.load(Ordering::Relaxed),
        }
    }
}

/// UDP receive loop feeding the subscriber hub
pub struct IngressListener {
    socket: UdpSocket,
    hub: Arc<SubscriberHub>,
    stats: Arc<IngressStats>,
    recv_buffer_size: usize,
}

impl IngressListener {
    /// Bind the ingress socket.
    ///
    /// A bind failure is returned as [`TelemetryError::BindFailure`] and is
    /// not retried.
    pub async fn bind(
        config: &IngressConfig,
        hub: Arc<SubscriberHub>,
        stats: Arc<IngressStats>,
    ) -> TelemetryResult<Self> {
        let addr: SocketAddr = tokio::net::lookup_host(config.addr())
            .await
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| TelemetryError::InvalidAddress(config.addr()))?;

        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|e| TelemetryError::bind_failure(addr, e))?;

        tracing::info!(addr = %socket.local_addr()?, "Telemetry ingress listening");

        Ok(Self {
            socket,
            hub,
            stats,
            recv_buffer_size: config.recv_buffer_size.max(RECORD_LEN + 1),
        })
    }

    /// Address the socket is bound to
    pub fn local_addr(&self) -> TelemetryResult<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Spawn the receive loop. The socket is released when the task is
    /// aborted.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Receive datagrams until the task is dropped
    pub async fn run(self) {
        let mut buf = vec![0u8; self.recv_buffer_size];

        loop {
            match self.socket.recv_from(&mut buf).await {
                Ok((len, peer)) => {
                    self.handle_datagram(&buf[..len], peer).await;
                }
                Err(e) => {
                    // e.g. ICMP port unreachable surfaced on some platforms
                    self.stats.recv_errors.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(error = %e, "UDP receive error");
                }
            }
        }
    }

    async fn handle_datagram(&self, datagram: &[u8], peer: SocketAddr) {
        self.stats.received.fetch_add(1, Ordering::Relaxed);

        match TelemetrySample::decode(datagram) {
            Ok(sample) => {
                self.stats.forwarded.fetch_add(1, Ordering::Relaxed);
                self.hub.publish_sample(&sample).await;
            }
            Err(e) => {
                let malformed = self.stats.malformed.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::debug!(peer = %peer, len = datagram.len(), malformed, error = %e, "Dropping datagram");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websocket::{HubConfig, ServerMessage};
    use std::time::Duration;

    async fn loopback_listener() -> (IngressListener, Arc<SubscriberHub>, Arc<IngressStats>) {
        let hub = Arc::new(SubscriberHub::new(HubConfig::default()));
        let stats = Arc::new(IngressStats::new());
        let config = IngressConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            ..Default::default()
        };
        let listener = IngressListener::bind(&config, Arc::clone(&hub), Arc::clone(&stats))
            .await
            .unwrap();
        (listener, hub, stats)
    }

    async fn recv(rx: &mut tokio::sync::mpsc::Receiver<ServerMessage>) -> ServerMessage {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for broadcast")
            .expect("queue closed")
    }

    #[tokio::test]
    async fn test_datagram_reaches_every_subscriber() {
        let (listener, hub, stats) = loopback_listener().await;
        let addr = listener.local_addr().unwrap();
        let mut a = hub.register().await.unwrap();
        let mut b = hub.register().await.unwrap();
        let handle = listener.spawn();

        let mut datagram = Vec::new();
        datagram.extend_from_slice(&1000i64.to_le_bytes());
        datagram.extend_from_slice(&10i32.to_le_bytes());
        datagram.extend_from_slice(&20i32.to_le_bytes());
        datagram.extend_from_slice(&1i32.to_le_bytes());
        datagram.extend_from_slice(&(-1i32).to_le_bytes());

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        sender.send_to(&datagram, addr).await.unwrap();

        for rx in [&mut a.receiver, &mut b.receiver] {
            let value = serde_json::to_value(recv(rx).await).unwrap();
            assert_eq!(value["event"], "eye_tracking_data");
            assert_eq!(
                value["data"],
                serde_json::json!({"timestamp": 1000, "l_cx": 10, "l_cy": 20, "l_dx": 1, "l_dy": -1})
            );
        }

        assert_eq!(stats.snapshot().forwarded, 1);
        handle.abort();
    }

    #[tokio::test]
    async fn test_malformed_datagrams_counted_and_skipped() {
        let (listener, hub, stats) = loopback_listener().await;
        let addr = listener.local_addr().unwrap();
        let mut sub = hub.register().await.unwrap();
        let handle = listener.spawn();

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        sender.send_to(&[0u8; 23], addr).await.unwrap();
        sender.send_to(&[0u8; 25], addr).await.unwrap();
        sender.send_to(&[], addr).await.unwrap();
        let good = TelemetrySample::new(5, 1, 2, 3, 4);
        sender.send_to(&good.encode(), addr).await.unwrap();

        // The listener survives the bad input and forwards the good record.
        assert_eq!(recv(&mut sub.receiver).await, ServerMessage::sample(&good));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.malformed, 3);
        assert_eq!(snapshot.forwarded, 1);
        assert_eq!(snapshot.received, 4);
        handle.abort();
    }

    #[tokio::test]
    async fn test_samples_arrive_in_order() {
        let (listener, hub, _stats) = loopback_listener().await;
        let addr = listener.local_addr().unwrap();
        let mut sub = hub.register().await.unwrap();
        let handle = listener.spawn();

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        for i in 0..50 {
            let sample = TelemetrySample::new(i, 0, 0, 0, 0);
            sender.send_to(&sample.encode(), addr).await.unwrap();
        }

        // Loopback keeps datagram order; the relay must not reorder them.
        let mut last = -1;
        for _ in 0..50 {
            match recv(&mut sub.receiver).await {
                ServerMessage::EyeTrackingData(data) => {
                    assert!(data.timestamp > last);
                    last = data.timestamp;
                }
                other => panic!("unexpected message {:?}", other),
            }
        }
        handle.abort();
    }

    #[tokio::test]
    async fn test_bind_failure_when_port_taken() {
        let (first, hub, stats) = loopback_listener().await;
        let taken = first.local_addr().unwrap();

        let config = IngressConfig {
            host: "127.0.0.1".to_string(),
            port: taken.port(),
            ..Default::default()
        };
        let result = IngressListener::bind(&config, hub, stats).await;
        assert!(matches!(result, Err(TelemetryError::BindFailure { .. })));
    }

    #[tokio::test]
    async fn test_socket_released_after_abort() {
        let (listener, hub, stats) = loopback_listener().await;
        let addr = listener.local_addr().unwrap();

        let handle = listener.spawn();
        handle.abort();
        let _ = handle.await;

        let config = IngressConfig {
            host: "127.0.0.1".to_string(),
            port: addr.port(),
            ..Default::default()
        };
        assert!(IngressListener::bind(&config, hub, stats).await.is_ok());
    }
}
