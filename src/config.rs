//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::producer::ProducerConfig;
use crate::telemetry::IngressConfig as TelemetryIngressConfig;
use crate::websocket::HubConfig as SubscriberHubConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ingress: IngressConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub producer: TrackerConfig,

    #[serde(default)]
    pub hub: HubConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// UDP telemetry ingress configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IngressConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_udp_port")]
    pub port: u16,

    #[serde(default = "default_recv_buffer_size")]
    pub recv_buffer_size: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_udp_port() -> u16 {
    7070
}

fn default_recv_buffer_size() -> usize {
    2048
}

impl Default for IngressConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_udp_port(),
            recv_buffer_size: default_recv_buffer_size(),
        }
    }
}

impl IngressConfig {
    pub fn to_listener_config(&self) -> TelemetryIngressConfig {
        TelemetryIngressConfig {
            host: self.host.clone(),
            port: self.port,
            recv_buffer_size: self.recv_buffer_size,
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_api_port")]
    pub port: u16,

    /// Allowed CORS origins; empty means permissive
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_api_port() -> u16 {
    3000
}

fn default_cors_origins() -> Vec<String> {
    // Vite dev server
    vec!["http://localhost:5173".to_string()]
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_api_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

impl ApiConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Tracking process configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "default_producer_url")]
    pub url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

fn default_producer_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_request_timeout() -> u64 {
    5000
}

fn default_connect_timeout() -> u64 {
    2000
}

fn default_poll_interval() -> u64 {
    1000 // 1 second
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            url: default_producer_url(),
            request_timeout_ms: default_request_timeout(),
            connect_timeout_ms: default_connect_timeout(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl TrackerConfig {
    pub fn to_client_config(&self) -> ProducerConfig {
        ProducerConfig {
            base_url: self.url.clone(),
            request_timeout_ms: self.request_timeout_ms,
            connect_timeout_ms: self.connect_timeout_ms,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Subscriber hub configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    #[serde(default = "default_max_subscribers")]
    pub max_subscribers: usize,

    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    #[serde(default = "default_send_timeout")]
    pub send_timeout_ms: u64,
}

fn default_max_subscribers() -> usize {
    1000
}

fn default_queue_capacity() -> usize {
    256
}

fn default_send_timeout() -> u64 {
    2000
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_subscribers: default_max_subscribers(),
            queue_capacity: default_queue_capacity(),
            send_timeout_ms: default_send_timeout(),
        }
    }
}

impl HubConfig {
    pub fn to_hub_config(&self) -> SubscriberHubConfig {
        SubscriberHubConfig {
            max_subscribers: self.max_subscribers,
            queue_capacity: self.queue_capacity,
            send_timeout: Duration::from_millis(self.send_timeout_ms),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        // Try default config locations
        let config_paths = [
            dirs::config_dir().map(|p| p.join("eyerelay").join("config.toml")),
            Some(PathBuf::from("/etc/eyerelay/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        // Fall back to environment-only config
        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup (the environment in production)
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Ingress overrides
        if let Some(host) = lookup("EYERELAY_UDP_HOST") {
            self.ingress.host = host;
        }
        if let Some(port) = lookup("EYERELAY_UDP_PORT").and_then(|p| p.parse().ok()) {
            self.ingress.port = port;
        }

        // API overrides
        if let Some(host) = lookup("EYERELAY_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = lookup("EYERELAY_API_PORT").and_then(|p| p.parse().ok()) {
            self.api.port = port;
        }

        // Tracking process overrides
        if let Some(url) = lookup("EYERELAY_PRODUCER_URL") {
            self.producer.url = url;
        }
        if let Some(ms) = lookup("EYERELAY_POLL_INTERVAL_MS").and_then(|p| p.parse().ok()) {
            self.producer.poll_interval_ms = ms;
        }

        // Logging overrides
        if let Some(level) = lookup("EYERELAY_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("EYERELAY_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Eyerelay Configuration
#
# Environment variables override these settings:
# - EYERELAY_UDP_HOST
# - EYERELAY_UDP_PORT
# - EYERELAY_API_HOST
# - EYERELAY_API_PORT
# - EYERELAY_PRODUCER_URL
# - EYERELAY_POLL_INTERVAL_MS
# - EYERELAY_LOG_LEVEL
# - EYERELAY_LOG_FORMAT

[ingress]
# Address the tracking process sends telemetry datagrams to
host = "0.0.0.0"
port = 7070

# Receive buffer size (bytes); records are 24 bytes
recv_buffer_size = 2048

[api]
# HTTP / WebSocket server
host = "0.0.0.0"
port = 3000

# Allowed CORS origins (empty list allows any origin)
cors_origins = ["http://localhost:5173"]

[producer]
# Control API of the tracking process
url = "http://localhost:5000"

# Timeout for start/stop/status calls (ms)
request_timeout_ms = 5000

# Connect timeout for the video stream (ms)
connect_timeout_ms = 2000

# How often to refresh status while streaming (ms)
poll_interval_ms = 1000

[hub]
# Maximum concurrent WebSocket subscribers
max_subscribers = 1000

# Per-subscriber outbound queue; a subscriber whose queue fills is dropped
queue_capacity = 256

# Upper bound on a single WebSocket write (ms)
send_timeout_ms = 2000

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.ingress.port, 7070);
        assert_eq!(config.api.port, 3000);
        assert_eq!(config.producer.url, "http://localhost:5000");
        assert_eq!(config.producer.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.hub.queue_capacity, 256);
        assert!(!config.logging.is_json());
    }

    #[test]
    fn test_generated_config_parses_to_defaults() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();
        let defaults = Config::default();

        assert_eq!(config.ingress.port, defaults.ingress.port);
        assert_eq!(config.api.port, defaults.api.port);
        assert_eq!(config.api.cors_origins, defaults.api.cors_origins);
        assert_eq!(config.producer.url, defaults.producer.url);
        assert_eq!(config.hub.send_timeout_ms, defaults.hub.send_timeout_ms);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[ingress]\nport = 9000\n\n[logging]\nformat = \"json\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.ingress.port, 9000);
        assert_eq!(config.ingress.host, "0.0.0.0");
        assert_eq!(config.api.port, 3000);
        assert!(config.logging.is_json());
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[ingress\nport = ").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load(Path::new("/nonexistent/eyerelay.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("EYERELAY_UDP_PORT", "7171"),
            ("EYERELAY_API_PORT", "not-a-port"),
            ("EYERELAY_PRODUCER_URL", "http://tracker:5000"),
            ("EYERELAY_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.ingress.port, 7171);
        // Unparseable values are ignored
        assert_eq!(config.api.port, 3000);
        assert_eq!(config.producer.url, "http://tracker:5000");
        assert!(config.logging.is_json());
    }

    #[test]
    fn test_conversions() {
        let config = Config::default();
        let hub = config.hub.to_hub_config();
        assert_eq!(hub.send_timeout, Duration::from_secs(2));

        let listener = config.ingress.to_listener_config();
        assert_eq!(listener.addr(), "0.0.0.0:7070");

        let client = config.producer.to_client_config();
        assert_eq!(client.base_url, "http://localhost:5000");
    }
}
