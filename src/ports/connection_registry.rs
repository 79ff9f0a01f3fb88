//! ConnectionRegistry port - Interface for tracking live connections.
//!
//! Each process terminates its own set of live connections. The registry
//! records them in a shared keyed store, partitioned by instance, so that
//! any component of that instance (lifecycle handler, broadcaster) sees the
//! same membership without holding a private copy.
//!
//! ## Use Case
//!
//! 1. Client connects to instance A
//! 2. Instance A registers the connection
//! 3. A verified event arrives on the channel
//! 4. Instance A snapshots its registry and sends to every connection
//! 5. Connections reported gone are unregistered (self-healing)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::broadcast::{ConnectionId, ConnectionRecord};

/// Identifier of one running instance of the service.
///
/// Format is typically hostname:port or container/pod ID. Registry keys are
/// namespaced by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(String);

impl InstanceId {
    /// Create a new instance ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the instance ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Instance ID from environment (hostname + port).
    pub fn from_env(port: u16) -> Self {
        let hostname = std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        Self(format!("{}:{}", hostname, port))
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for InstanceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Errors that can occur in connection registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionRegistryError {
    /// Backing store communication error
    #[error("Redis error: {0}")]
    Redis(String),

    /// Stored record could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Port for the keyed store of live connections.
///
/// Implementations must ensure:
/// - `register` is an upsert: the first call fixes `registered_at`, later
///   calls only refresh `last_seen_at`
/// - `unregister` of an absent id succeeds without changing state
/// - `snapshot` only ever returns ids that were registered
/// - Concurrent calls from several tasks or processes do not corrupt state;
///   the store's single-key conditional writes are relied upon, not locks
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// Register (or refresh) a connection. Returns the stored record.
    async fn register(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<ConnectionRecord, ConnectionRegistryError>;

    /// Remove a connection. Absence is not an error.
    async fn unregister(&self, connection_id: &ConnectionId)
        -> Result<(), ConnectionRegistryError>;

    /// Point-in-time list of registered connections, sorted by id.
    async fn snapshot(&self) -> Result<Vec<ConnectionId>, ConnectionRegistryError>;

    /// Look up one connection's record.
    async fn get(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<Option<ConnectionRecord>, ConnectionRegistryError>;
}
