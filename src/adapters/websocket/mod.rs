//! WebSocket adapters for live payment event delivery.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Event Channel                               │
//! │   InMemoryEventChannel (test) │ RedisEventChannel (production)      │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ subscribes
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Broadcaster                                 │
//! │   - Snapshots the connection registry                               │
//! │   - Sends the payload to every connection through the hub           │
//! │   - Prunes connections the hub reports gone                         │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ ConnectionSender::send
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       ConnectionHub                                 │
//! │   c1 ──queue──► socket     c2 ──queue──► socket     ...             │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`messages`] - Control message protocol types
//! - [`hub`] - Local per-connection outbound queues
//! - [`handler`] - Axum WebSocket upgrade handler

pub mod handler;
pub mod hub;
pub mod messages;

pub use handler::{websocket_router, ws_handler, WebSocketState, DEFAULT_REFRESH_INTERVAL};
pub use hub::ConnectionHub;
pub use messages::{ClientMessage, ConnectedMessage, ErrorMessage, PongMessage, ServerMessage};
