//! WebSocket Real-Time Streaming
//!
//! Pushes every telemetry sample to connected dashboards.
//!
//! ## Architecture
//!
//! - **SubscriberHub**: Registry of live subscribers plus the fan-out engine
//! - **Handler**: Handles WebSocket upgrade and the per-connection tasks
//! - **Messages**: Defines client and server message formats
//!
//! ## Usage
//!
//! Clients connect to `/ws` and immediately start receiving:
//! - `connected` - their subscriber id
//! - `session_status` - current session snapshot, then every change
//! - `eye_tracking_data` - one event per decoded datagram
//!
//! ## Example
//!
//! ```javascript
//! // Browser
//! const ws = new WebSocket('ws://localhost:3000/ws');
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   if (msg.event === 'eye_tracking_data') {
//!     console.log(msg.data.l_cx, msg.data.l_cy);
//!   }
//! };
//! ```

mod handler;
mod hub;
mod messages;

pub use handler::websocket_handler;
pub use hub::{
    BroadcastReport, HubConfig, HubError, HubStats, SubscriberHandle, SubscriberHub, SubscriberId,
    Subscription,
};
pub use messages::{ClientMessage, EyeTrackingData, ServerMessage};
