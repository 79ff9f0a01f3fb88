//! WebSocket control message types.
//!
//! Defines the protocol between server and connected clients:
//! - Server → Client: connection status, pongs, errors
//! - Client → Server: pings
//!
//! Broadcast payloads are not wrapped: clients receive the verified webhook
//! body exactly as the provider signed it.

use axum::extract::ws::Message;
use serde::{Deserialize, Serialize};

// ============================================
// Server → Client Messages
// ============================================

/// All control messages that can be sent from server to client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection established and registered.
    Connected(ConnectedMessage),

    /// Heartbeat response.
    Pong(PongMessage),

    /// Client sent something the server does not understand.
    Error(ErrorMessage),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedMessage {
    pub connection_id: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PongMessage {
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorMessage {
    pub code: String,
    pub message: String,
}

// ============================================
// Client → Server Messages
// ============================================

/// All message types that can be received from client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Heartbeat request; also refreshes the registry record.
    Ping,
}

/// Frame for a broadcast payload: text when it is UTF-8, binary otherwise.
pub fn payload_frame(payload: &[u8]) -> Message {
    match std::str::from_utf8(payload) {
        Ok(text) => Message::Text(text.to_string()),
        Err(_) => Message::Binary(payload.to_vec()),
    }
}
