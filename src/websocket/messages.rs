//! WebSocket Message Types
//!
//! Defines all message types for WebSocket communication between
//! subscribers (dashboards) and the relay. Frames are JSON text,
//! tagged as `{"event": "<name>", "data": {...}}`.

use serde::{Deserialize, Serialize};

use crate::session::StatusSnapshot;
use crate::telemetry::TelemetrySample;

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection established
    Connected {
        /// Unique subscriber identifier
        subscriber_id: String,
    },
    /// One telemetry sample
    EyeTrackingData(EyeTrackingData),
    /// Session state or counters changed
    SessionStatus(StatusSnapshot),
    /// Pong response to ping
    Pong,
    /// Error message
    Error {
        /// Error description
        message: String,
    },
}

/// Payload of the `eye_tracking_data` event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EyeTrackingData {
    /// Producer timestamp as a plain number
    pub timestamp: i64,
    pub l_cx: i32,
    pub l_cy: i32,
    pub l_dx: i32,
    pub l_dy: i32,
}

impl From<&TelemetrySample> for EyeTrackingData {
    fn from(sample: &TelemetrySample) -> Self {
        Self {
            timestamp: sample.timestamp_micros,
            l_cx: sample.left_x,
            l_cy: sample.left_y,
            l_dx: sample.left_delta_x,
            l_dy: sample.left_delta_y,
        }
    }
}

impl ServerMessage {
    pub fn sample(sample: &TelemetrySample) -> Self {
        ServerMessage::EyeTrackingData(sample.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_message_deserialize_ping() {
        let json = r#"{"event": "ping"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, ClientMessage::Ping));
    }

    #[test]
    fn test_client_message_rejects_unknown_event() {
        let json = r#"{"event": "eye_tracking_data", "data": {}}"#;
        assert!(serde_json::from_str::<ClientMessage>(json).is_err());
    }

    #[test]
    fn test_serialize_eye_tracking_data() {
        let sample = TelemetrySample::new(1000, 10, 20, 1, -1);
        let value = serde_json::to_value(ServerMessage::sample(&sample)).unwrap();
        assert_eq!(
            value,
            json!({
                "event": "eye_tracking_data",
                "data": {"timestamp": 1000, "l_cx": 10, "l_cy": 20, "l_dx": 1, "l_dy": -1}
            })
        );
    }

    #[test]
    fn test_serialize_connected() {
        let msg = ServerMessage::Connected {
            subscriber_id: "abc-123".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"event\":\"connected\""));
        assert!(json.contains("\"subscriber_id\":\"abc-123\""));
    }

    #[test]
    fn test_serialize_pong() {
        let json = serde_json::to_string(&ServerMessage::Pong).unwrap();
        assert_eq!(json, r#"{"event":"pong"}"#);
    }

    #[test]
    fn test_serialize_session_status() {
        let value = serde_json::to_value(ServerMessage::SessionStatus(StatusSnapshot::idle())).unwrap();
        assert_eq!(value["event"], "session_status");
        assert_eq!(value["data"]["state"], "idle");
        assert_eq!(value["data"]["totalBlinks"], 0);
    }
}
