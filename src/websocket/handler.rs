//! WebSocket Handler
//!
//! Handles WebSocket upgrade requests and manages the subscriber lifecycle.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;

use super::hub::{HubError, SubscriberHub};
use super::messages::{ClientMessage, ServerMessage};
use crate::api::AppState;
use crate::session::SessionController;

/// WebSocket upgrade handler
///
/// This is the entry point for subscriber connections.
/// It upgrades the HTTP connection to WebSocket and starts message handling.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    let hub = Arc::clone(&state.hub);
    let session = Arc::clone(&state.session);
    ws.on_upgrade(move |socket| handle_socket(socket, hub, session))
}

/// Handle an established WebSocket connection
async fn handle_socket(socket: WebSocket, hub: Arc<SubscriberHub>, session: Arc<SessionController>) {
    let (mut sender, mut receiver) = socket.split();
    let send_timeout = hub.config().send_timeout;

    // Register with hub
    let subscription = match hub.register().await {
        Ok(subscription) => subscription,
        Err(e) => {
            tracing::error!(error = %e, "Failed to register subscriber");
            // Send error message before closing
            let _ = send_message(&mut sender, &ServerMessage::error(e.to_string()), send_timeout).await;
            let _ = sender.close().await;
            return;
        }
    };
    let subscriber_id = subscription.id;
    let mut rx = subscription.receiver;

    // Greet with the subscriber id and the current session status
    let greeting = [
        ServerMessage::Connected {
            subscriber_id: subscriber_id.clone(),
        },
        ServerMessage::SessionStatus(session.snapshot().await),
    ];
    for message in &greeting {
        if let Err(e) = send_message(&mut sender, message, send_timeout).await {
            tracing::debug!(subscriber_id = %subscriber_id, error = %e, "Failed to send greeting");
            hub.unregister(&subscriber_id).await;
            return;
        }
    }

    let id_for_send = subscriber_id.clone();

    // Task to forward queued messages to the WebSocket
    let mut send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if let Err(e) = send_message(&mut sender, &message, send_timeout).await {
                tracing::debug!(
                    subscriber_id = %id_for_send,
                    error = %e,
                    "WebSocket send failed, closing connection"
                );
                break;
            }
        }
    });

    let hub_for_recv = Arc::clone(&hub);
    let id_for_recv = subscriber_id.clone();

    // Task to receive frames from the WebSocket and handle them
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(msg) => {
                    if !handle_ws_message(&hub_for_recv, &id_for_recv, msg).await {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(
                        subscriber_id = %id_for_recv,
                        error = %e,
                        "WebSocket receive error"
                    );
                    break;
                }
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    // Cleanup: unregister from hub
    hub.unregister(&subscriber_id).await;
}

/// Serialize and write one message, bounded by `timeout`
async fn send_message(
    sender: &mut SplitSink<WebSocket, Message>,
    message: &ServerMessage,
    timeout: Duration,
) -> Result<(), HubError> {
    let text = match serde_json::to_string(message) {
        Ok(text) => text,
        Err(e) => {
            // Skip the message, keep the connection.
            tracing::error!(error = %e, "Failed to serialize message");
            return Ok(());
        }
    };

    match tokio::time::timeout(timeout, sender.send(Message::Text(text))).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(_)) => Err(HubError::SendFailed),
        Err(_) => Err(HubError::SendTimeout),
    }
}

/// Handle a received WebSocket frame
///
/// Returns false if the connection should be closed.
async fn handle_ws_message(hub: &Arc<SubscriberHub>, subscriber_id: &str, message: Message) -> bool {
    match message {
        Message::Text(text) => {
            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Ping) => {
                    tracing::debug!(subscriber_id = %subscriber_id, "Ping");
                    let _ = hub.send_to(subscriber_id, ServerMessage::Pong).await;
                }
                Err(e) => {
                    tracing::debug!(
                        subscriber_id = %subscriber_id,
                        error = %e,
                        text = %text,
                        "Invalid client message"
                    );
                    // Send error but keep connection open
                    let error_msg = ServerMessage::error(format!(
                        "Unsupported message: only {{\"event\": \"ping\"}} is accepted ({})",
                        e
                    ));
                    let _ = hub.send_to(subscriber_id, error_msg).await;
                }
            }
            true
        }
        Message::Binary(_) => {
            let error_msg = ServerMessage::error("Binary messages not supported");
            let _ = hub.send_to(subscriber_id, error_msg).await;
            true
        }
        Message::Ping(_) | Message::Pong(_) => {
            // Axum answers protocol pings automatically
            true
        }
        Message::Close(_) => {
            tracing::debug!(subscriber_id = %subscriber_id, "Client requested close");
            false
        }
    }
}
