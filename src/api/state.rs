//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::config::ApiConfig;
use crate::session::SessionController;
use crate::telemetry::IngressStats;
use crate::websocket::SubscriberHub;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Session state machine in front of the tracking process
    pub session: Arc<SessionController>,
    /// Subscriber registry and fan-out engine
    pub hub: Arc<SubscriberHub>,
    /// Counters of the telemetry ingress loop
    pub ingress_stats: Arc<IngressStats>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Address the ingress socket is bound to, once bound
    pub ingress_addr: Option<SocketAddr>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        session: Arc<SessionController>,
        hub: Arc<SubscriberHub>,
        ingress_stats: Arc<IngressStats>,
        config: ApiConfig,
    ) -> Self {
        Self {
            session,
            hub,
            ingress_stats,
            config: Arc::new(config),
            ingress_addr: None,
            start_time: Instant::now(),
        }
    }

    /// Record the bound ingress address; the service reports ready afterwards
    pub fn with_ingress_addr(mut self, addr: SocketAddr) -> Self {
        self.ingress_addr = Some(addr);
        self
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
