//! WebSocket upgrade handler for live payment event subscribers.
//!
//! Handles the HTTP → WebSocket upgrade and manages the connection lifecycle:
//! 1. Upgrade to WebSocket
//! 2. Attach to the local hub and register in the connection registry
//! 3. Forward broadcast payloads, answer pings and refresh the registration
//!    until disconnect
//! 4. Detach and unregister

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::application::ConnectionLifecycle;
use crate::domain::broadcast::ConnectionId;
use crate::domain::foundation::Timestamp;

use super::hub::ConnectionHub;
use super::messages::{
    payload_frame, ClientMessage, ConnectedMessage, ErrorMessage, PongMessage, ServerMessage,
};

/// Default period between server-side registration refreshes.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(40);

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    pub hub: Arc<ConnectionHub>,
    pub lifecycle: Arc<ConnectionLifecycle>,
    /// How often an open socket re-registers, keeping its registry TTL armed
    /// even when the client never pings.
    pub refresh_interval: Duration,
}

impl WebSocketState {
    pub fn new(hub: Arc<ConnectionHub>, lifecycle: Arc<ConnectionLifecycle>) -> Self {
        Self {
            hub,
            lifecycle,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval.max(Duration::from_secs(1));
        self
    }
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /ws`
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<WebSocketState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Runs for the lifetime of one connection.
async fn handle_socket(socket: WebSocket, state: WebSocketState) {
    let connection_id = ConnectionId::generate();
    let mut outbound = state.hub.attach(connection_id.clone()).await;

    if let Err(e) = state.lifecycle.on_connect(&connection_id).await {
        tracing::warn!(connection_id = %connection_id, error = %e, "Failed to register connection");
        state.hub.detach(&connection_id).await;
        return;
    }

    let (mut sender, mut receiver) = socket.split();

    let connected = ServerMessage::Connected(ConnectedMessage {
        connection_id: connection_id.to_string(),
        timestamp: Timestamp::now().to_rfc3339(),
    });

    if let Err(e) = send_message(&mut sender, &connected).await {
        tracing::debug!(connection_id = %connection_id, "Failed to send connected message: {}", e);
    } else {
        let period = state.refresh_interval.max(Duration::from_secs(1));
        let mut refresh = interval_at(Instant::now() + period, period);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = refresh.tick() => {
                    if let Err(e) = state.lifecycle.on_heartbeat(&connection_id).await {
                        tracing::warn!(connection_id = %connection_id, error = %e, "Failed to refresh connection");
                    }
                }

                payload = outbound.recv() => {
                    let Some(payload) = payload else { break };
                    if let Err(e) = sender.send(payload_frame(&payload)).await {
                        tracing::debug!(connection_id = %connection_id, "Send error, closing connection: {}", e);
                        break;
                    }
                }

                incoming = receiver.next() => match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let reply = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::Ping) => {
                                if let Err(e) = state.lifecycle.on_heartbeat(&connection_id).await {
                                    tracing::warn!(connection_id = %connection_id, error = %e, "Failed to refresh connection");
                                }
                                ServerMessage::Pong(PongMessage {
                                    timestamp: Timestamp::now().to_rfc3339(),
                                })
                            }
                            Err(_) => ServerMessage::Error(ErrorMessage {
                                code: "UNSUPPORTED_MESSAGE".to_string(),
                                message: "expected {\"type\":\"ping\"}".to_string(),
                            }),
                        };
                        if send_message(&mut sender, &reply).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(connection_id = %connection_id, "Client closed connection");
                        break;
                    }
                    Some(Ok(_)) => {
                        // Binary and protocol ping/pong frames carry nothing for us
                    }
                    Some(Err(e)) => {
                        tracing::debug!(connection_id = %connection_id, "Receive error: {}", e);
                        break;
                    }
                },
            }
        }
    }

    state.hub.detach(&connection_id).await;
    if let Err(e) = state.lifecycle.on_disconnect(&connection_id).await {
        // Left for the broadcaster to prune on its next Gone
        tracing::warn!(connection_id = %connection_id, error = %e, "Failed to unregister connection");
    }
}

/// Send a JSON control message over the WebSocket.
async fn send_message(
    sender: &mut SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(msg).map_err(axum::Error::new)?;
    sender.send(Message::Text(json)).await
}

/// Create axum router for the WebSocket endpoint.
pub fn websocket_router() -> Router<WebSocketState> {
    Router::new().route("/ws", get(ws_handler))
}
