//! Redis-backed connection registry for production deployments.
//!
//! Layout per instance:
//!
//! ```text
//! {prefix}:{instance}:connections        SET  of connection ids
//! {prefix}:{instance}:conn:{id}          HASH registered_at, last_seen_at
//! ```
//!
//! `registered_at` is written with `HSETNX` so only the first registration
//! sets it. Register and unregister each run as one `MULTI`/`EXEC` block, so
//! the index set and the record hash never disagree.
//!
//! Every register (including heartbeats) re-arms a TTL on both keys. Keys of
//! an instance that disappears expire on their own; index members whose hash
//! has already expired are dropped by `snapshot`.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::time::Duration;

use crate::domain::broadcast::{ConnectionId, ConnectionRecord};
use crate::domain::foundation::Timestamp;
use crate::ports::{ConnectionRegistry, ConnectionRegistryError, InstanceId};

const REGISTERED_AT: &str = "registered_at";
const LAST_SEEN_AT: &str = "last_seen_at";

/// Default lifetime of a registration without a refresh.
pub const DEFAULT_RECORD_TTL: Duration = Duration::from_secs(120);

/// Redis-backed registry scoped to one instance.
#[derive(Clone)]
pub struct RedisConnectionRegistry {
    conn: MultiplexedConnection,
    prefix: String,
    instance_id: InstanceId,
    ttl: Duration,
}

impl RedisConnectionRegistry {
    /// Create a registry for `instance_id` under `prefix`.
    pub fn new(
        conn: MultiplexedConnection,
        prefix: impl Into<String>,
        instance_id: InstanceId,
    ) -> Self {
        Self {
            conn,
            prefix: prefix.into(),
            instance_id,
            ttl: DEFAULT_RECORD_TTL,
        }
    }

    /// Sets how long a registration lives without a refresh.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn ttl_secs(&self) -> i64 {
        ttl_secs(self.ttl)
    }

    fn index_key(&self) -> String {
        format!("{}:{}:connections", self.prefix, self.instance_id)
    }

    fn record_key(&self, connection_id: &ConnectionId) -> String {
        format!("{}:{}:conn:{}", self.prefix, self.instance_id, connection_id)
    }
}

/// Decodes a stored hash. An empty hash means the record does not exist.
fn record_from_hash(
    connection_id: &ConnectionId,
    fields: &HashMap<String, String>,
) -> Result<Option<ConnectionRecord>, ConnectionRegistryError> {
    if fields.is_empty() {
        return Ok(None);
    }

    let registered_at = fields
        .get(REGISTERED_AT)
        .and_then(|raw| Timestamp::parse_rfc3339(raw))
        .ok_or_else(|| {
            ConnectionRegistryError::Serialization(format!(
                "connection {} has no valid {}",
                connection_id, REGISTERED_AT
            ))
        })?;
    let last_seen_at = fields
        .get(LAST_SEEN_AT)
        .and_then(|raw| Timestamp::parse_rfc3339(raw));

    Ok(Some(ConnectionRecord {
        connection_id: connection_id.clone(),
        registered_at,
        last_seen_at,
    }))
}

#[async_trait]
impl ConnectionRegistry for RedisConnectionRegistry {
    async fn register(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<ConnectionRecord, ConnectionRegistryError> {
        let record_key = self.record_key(connection_id);
        let now = Timestamp::now().to_rfc3339();

        let mut conn = self.conn.clone();
        let (fields,): (HashMap<String, String>,) = redis::pipe()
            .atomic()
            .hset_nx(&record_key, REGISTERED_AT, &now)
            .ignore()
            .hset(&record_key, LAST_SEEN_AT, &now)
            .ignore()
            .sadd(self.index_key(), connection_id.as_str())
            .ignore()
            .expire(&record_key, self.ttl_secs())
            .ignore()
            .expire(self.index_key(), self.ttl_secs())
            .ignore()
            .hgetall(&record_key)
            .query_async(&mut conn)
            .await
            .map_err(|e: redis::RedisError| ConnectionRegistryError::Redis(e.to_string()))?;

        record_from_hash(connection_id, &fields)?.ok_or_else(|| {
            ConnectionRegistryError::Redis(format!("connection {} vanished during register", connection_id))
        })
    }

    async fn unregister(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<(), ConnectionRegistryError> {
        let mut conn = self.conn.clone();
        redis::pipe()
            .atomic()
            .del(self.record_key(connection_id))
            .ignore()
            .srem(self.index_key(), connection_id.as_str())
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e: redis::RedisError| ConnectionRegistryError::Redis(e.to_string()))
    }

    async fn snapshot(&self) -> Result<Vec<ConnectionId>, ConnectionRegistryError> {
        let mut conn = self.conn.clone();
        let mut members: Vec<String> = conn
            .smembers(self.index_key())
            .await
            .map_err(|e: redis::RedisError| ConnectionRegistryError::Redis(e.to_string()))?;
        if members.is_empty() {
            return Ok(Vec::new());
        }
        members.sort();

        let mut pipe = redis::pipe();
        for member in &members {
            pipe.exists(format!("{}:{}:conn:{}", self.prefix, self.instance_id, member));
        }
        let exists: Vec<bool> = pipe
            .query_async(&mut conn)
            .await
            .map_err(|e: redis::RedisError| ConnectionRegistryError::Redis(e.to_string()))?;

        let (live, stale) = partition_live(members, &exists);
        if !stale.is_empty() {
            let removed: Result<(), redis::RedisError> =
                conn.srem(self.index_key(), &stale).await;
            match removed {
                Ok(()) => tracing::debug!(
                    instance_id = %self.instance_id,
                    stale = stale.len(),
                    "Dropped expired connections from index"
                ),
                Err(e) => tracing::warn!(
                    instance_id = %self.instance_id,
                    error = %e,
                    "Failed to drop expired connections from index"
                ),
            }
        }

        Ok(live)
    }

    async fn get(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<Option<ConnectionRecord>, ConnectionRegistryError> {
        let mut conn = self.conn.clone();
        let fields: HashMap<String, String> = conn
            .hgetall(self.record_key(connection_id))
            .await
            .map_err(|e: redis::RedisError| ConnectionRegistryError::Redis(e.to_string()))?;

        record_from_hash(connection_id, &fields)
    }
}

/// TTL in whole seconds, never zero.
fn ttl_secs(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_secs().max(1)).unwrap_or(i64::MAX)
}

/// Splits index members into live ids and stale members.
///
/// `exists[i]` tells whether the record hash of `members[i]` is still there.
/// Members that are not valid ids are stale too.
fn partition_live(members: Vec<String>, exists: &[bool]) -> (Vec<ConnectionId>, Vec<String>) {
    let mut live = Vec::new();
    let mut stale = Vec::new();

    for (member, present) in members.into_iter().zip(exists.iter().copied()) {
        match ConnectionId::parse(member.clone()) {
            Ok(connection_id) if present => live.push(connection_id),
            _ => stale.push(member),
        }
    }

    (live, stale)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ConnectionId {
        ConnectionId::parse(s).unwrap()
    }

    #[test]
    fn empty_hash_is_absent() {
        assert_eq!(record_from_hash(&id("c1"), &HashMap::new()), Ok(None));
    }

    #[test]
    fn hash_decodes_to_record() {
        let registered = Timestamp::from_unix_secs(1_000).unwrap();
        let seen = Timestamp::from_unix_secs(2_000).unwrap();
        let fields = HashMap::from([
            (REGISTERED_AT.to_string(), registered.to_rfc3339()),
            (LAST_SEEN_AT.to_string(), seen.to_rfc3339()),
        ]);

        let record = record_from_hash(&id("c1"), &fields).unwrap().unwrap();

        assert_eq!(record.registered_at, registered);
        assert_eq!(record.last_seen_at, Some(seen));
    }

    #[test]
    fn hash_without_registration_time_is_corrupt() {
        let fields = HashMap::from([(LAST_SEEN_AT.to_string(), Timestamp::now().to_rfc3339())]);

        assert!(matches!(
            record_from_hash(&id("c1"), &fields),
            Err(ConnectionRegistryError::Serialization(_))
        ));
    }

    #[test]
    fn members_without_a_record_are_stale() {
        let members = vec!["c1".to_string(), "c2".to_string(), "c3".to_string()];

        let (live, stale) = partition_live(members, &[true, false, true]);

        assert_eq!(live, vec![id("c1"), id("c3")]);
        assert_eq!(stale, vec!["c2".to_string()]);
    }

    #[test]
    fn blank_members_are_stale() {
        let (live, stale) = partition_live(vec![" ".to_string()], &[true]);

        assert!(live.is_empty());
        assert_eq!(stale, vec![" ".to_string()]);
    }

    #[test]
    fn ttl_never_rounds_down_to_zero() {
        assert_eq!(ttl_secs(Duration::from_millis(200)), 1);
        assert_eq!(ttl_secs(DEFAULT_RECORD_TTL), 120);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Live Redis
    // ════════════════════════════════════════════════════════════════════════════

    async fn registry(instance: &str) -> RedisConnectionRegistry {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        let client = redis::Client::open(url).unwrap();
        let conn = client.get_multiplexed_async_connection().await.unwrap();
        let prefix = format!("payment-fanout-test-{}", uuid::Uuid::new_v4());
        RedisConnectionRegistry::new(conn, prefix, InstanceId::new(instance))
    }

    #[tokio::test]
    #[ignore = "requires a running Redis instance"]
    async fn register_is_an_upsert() {
        let registry = registry("i1").await;

        let first = registry.register(&id("c1")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = registry.register(&id("c1")).await.unwrap();

        assert_eq!(second.registered_at, first.registered_at);
        assert!(second.last_seen_at > first.last_seen_at);
        assert_eq!(registry.snapshot().await.unwrap(), vec![id("c1")]);
    }

    #[tokio::test]
    #[ignore = "requires a running Redis instance"]
    async fn unregister_is_idempotent() {
        let registry = registry("i1").await;
        registry.register(&id("c1")).await.unwrap();
        registry.register(&id("c2")).await.unwrap();

        registry.unregister(&id("c2")).await.unwrap();
        registry.unregister(&id("c2")).await.unwrap();

        assert_eq!(registry.snapshot().await.unwrap(), vec![id("c1")]);
        assert!(registry.get(&id("c2")).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "requires a running Redis instance"]
    async fn instances_do_not_see_each_other() {
        let a = registry("a").await;
        let b = RedisConnectionRegistry::new(a.conn.clone(), a.prefix.clone(), InstanceId::new("b"));

        a.register(&id("c1")).await.unwrap();

        assert!(b.snapshot().await.unwrap().is_empty());
        b.unregister(&id("c1")).await.unwrap();
        assert_eq!(a.snapshot().await.unwrap(), vec![id("c1")]);
    }

    #[tokio::test]
    #[ignore = "requires a running Redis instance"]
    async fn registrations_expire_without_refresh() {
        let registry = registry("i1").await.with_ttl(Duration::from_secs(1));
        registry.register(&id("c1")).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1_500)).await;

        assert!(registry.get(&id("c1")).await.unwrap().is_none());
        assert!(registry.snapshot().await.unwrap().is_empty());
    }

    #[tokio::test]
    #[ignore = "requires a running Redis instance"]
    async fn snapshot_drops_members_whose_record_expired() {
        let registry = registry("i1").await.with_ttl(Duration::from_secs(60));
        registry.register(&id("c1")).await.unwrap();
        registry.register(&id("c2")).await.unwrap();

        let mut conn = registry.conn.clone();
        let _: () = conn.del(registry.record_key(&id("c2"))).await.unwrap();

        assert_eq!(registry.snapshot().await.unwrap(), vec![id("c1")]);
        let members: Vec<String> = conn.smembers(registry.index_key()).await.unwrap();
        assert_eq!(members, vec!["c1".to_string()]);
    }
}
