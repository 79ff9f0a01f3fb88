//! In-memory connection registry for tests and single-node runs.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::domain::broadcast::{ConnectionId, ConnectionRecord};
use crate::domain::foundation::Timestamp;
use crate::ports::{ConnectionRegistry, ConnectionRegistryError};

/// Registry held in process memory.
///
/// Same upsert and idempotent-delete contract as the Redis adapter. The
/// single `RwLock` makes every operation atomic with respect to the others.
#[derive(Default)]
pub struct InMemoryConnectionRegistry {
    records: RwLock<BTreeMap<ConnectionId, ConnectionRecord>>,
}

impl InMemoryConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered connections.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn register(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<ConnectionRecord, ConnectionRegistryError> {
        let now = Timestamp::now();
        let mut records = self.records.write().await;
        let record = records
            .entry(connection_id.clone())
            .and_modify(|record| record.touch(now))
            .or_insert_with(|| ConnectionRecord::new(connection_id.clone(), now));
        Ok(record.clone())
    }

    async fn unregister(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<(), ConnectionRegistryError> {
        self.records.write().await.remove(connection_id);
        Ok(())
    }

    async fn snapshot(&self) -> Result<Vec<ConnectionId>, ConnectionRegistryError> {
        Ok(self.records.read().await.keys().cloned().collect())
    }

    async fn get(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<Option<ConnectionRecord>, ConnectionRegistryError> {
        Ok(self.records.read().await.get(connection_id).cloned())
    }
}
