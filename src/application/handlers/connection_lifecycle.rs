//! Connection lifecycle - maps transport connect/disconnect signals onto the
//! registry's idempotent register/unregister.

use std::sync::Arc;

use crate::domain::broadcast::{ConnectionId, ConnectionRecord};
use crate::ports::{ConnectionRegistry, ConnectionRegistryError};

pub struct ConnectionLifecycle {
    registry: Arc<dyn ConnectionRegistry>,
}

impl ConnectionLifecycle {
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// A connection opened. Duplicate notifications are harmless.
    pub async fn on_connect(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<ConnectionRecord, ConnectionRegistryError> {
        let record = self.registry.register(connection_id).await?;
        tracing::info!(connection_id = %connection_id, "Connection registered");
        Ok(record)
    }

    /// The connection showed signs of life; refreshes `last_seen_at`.
    pub async fn on_heartbeat(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<ConnectionRecord, ConnectionRegistryError> {
        let record = self.registry.register(connection_id).await?;
        tracing::trace!(connection_id = %connection_id, "Connection heartbeat");
        Ok(record)
    }

    /// A connection closed. Unknown ids are not an error.
    pub async fn on_disconnect(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<(), ConnectionRegistryError> {
        self.registry.unregister(connection_id).await?;
        tracing::info!(connection_id = %connection_id, "Connection unregistered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::registry::InMemoryConnectionRegistry;

    fn cid(s: &str) -> ConnectionId {
        ConnectionId::parse(s).unwrap()
    }

    #[tokio::test]
    async fn connect_then_disconnect_leaves_registry_empty() {
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let lifecycle = ConnectionLifecycle::new(registry.clone());

        lifecycle.on_connect(&cid("c1")).await.unwrap();
        assert_eq!(registry.snapshot().await.unwrap(), vec![cid("c1")]);

        lifecycle.on_disconnect(&cid("c1")).await.unwrap();
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn duplicate_connect_and_disconnect_are_harmless() {
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let lifecycle = ConnectionLifecycle::new(registry.clone());

        let first = lifecycle.on_connect(&cid("c1")).await.unwrap();
        let again = lifecycle.on_connect(&cid("c1")).await.unwrap();
        assert_eq!(again.registered_at, first.registered_at);
        assert_eq!(registry.len().await, 1);

        lifecycle.on_disconnect(&cid("c1")).await.unwrap();
        lifecycle.on_disconnect(&cid("c1")).await.unwrap();
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn heartbeat_keeps_registration_time() {
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let lifecycle = ConnectionLifecycle::new(registry.clone());

        let first = lifecycle.on_connect(&cid("c1")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let refreshed = lifecycle.on_heartbeat(&cid("c1")).await.unwrap();

        assert_eq!(refreshed.registered_at, first.registered_at);
        assert!(refreshed.last_seen_at > first.last_seen_at);
    }
}
