//! Local hub of open WebSocket connections.
//!
//! Each socket task owns the receiving end of a bounded queue; the hub keeps
//! the sending ends keyed by connection id and implements `ConnectionSender`
//! on top of them.
//!
//! # Architecture
//!
//! ```text
//! Broadcaster ──send(c1)──► ConnectionHub ──queue──► socket task c1 ──► client
//!             ──send(c2)──►               ──queue──► socket task c2 ──► client
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

use crate::domain::broadcast::{ConnectionId, DeliveryOutcome};
use crate::ports::ConnectionSender;

/// Manages the outbound queues of sockets terminated by this process.
///
/// # Thread Safety
///
/// Uses `RwLock` since sends (reads) vastly outnumber attach/detach (writes).
pub struct ConnectionHub {
    connections: RwLock<HashMap<ConnectionId, mpsc::Sender<Arc<[u8]>>>>,
    buffer: usize,
}

impl ConnectionHub {
    /// Create a hub whose per-connection queues hold `buffer` payloads.
    pub fn new(buffer: usize) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            buffer: buffer.max(1),
        }
    }

    /// Attach a socket and return the queue it should drain.
    ///
    /// Re-attaching an id replaces its previous queue.
    pub async fn attach(&self, connection_id: ConnectionId) -> mpsc::Receiver<Arc<[u8]>> {
        let (tx, rx) = mpsc::channel(self.buffer);
        self.connections.write().await.insert(connection_id, tx);
        rx
    }

    /// Detach a socket. Later sends to it report `Gone`.
    pub async fn detach(&self, connection_id: &ConnectionId) {
        self.connections.write().await.remove(connection_id);
    }

    /// Number of attached sockets.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_attached(&self, connection_id: &ConnectionId) -> bool {
        self.connections.read().await.contains_key(connection_id)
    }
}

impl Default for ConnectionHub {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl ConnectionSender for ConnectionHub {
    async fn send(&self, connection_id: &ConnectionId, payload: Arc<[u8]>) -> DeliveryOutcome {
        let Some(queue) = self.connections.read().await.get(connection_id).cloned() else {
            return DeliveryOutcome::Gone;
        };

        match queue.try_send(payload) {
            Ok(()) => DeliveryOutcome::Ok,
            Err(mpsc::error::TrySendError::Full(_)) => DeliveryOutcome::transient("send queue full"),
            Err(mpsc::error::TrySendError::Closed(_)) => DeliveryOutcome::Gone,
        }
    }
}
