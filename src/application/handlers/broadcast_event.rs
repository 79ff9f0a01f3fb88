//! Broadcaster - fans one verified event out to every live connection.
//!
//! One pass per event:
//! 1. Snapshot the registry
//! 2. Send to every connection concurrently, all sharing one deadline
//! 3. `Gone` unregisters the connection; transient failures and timeouts
//!    leave it registered
//!
//! Retrying a skipped connection is left to the channel's redelivery of the
//! event, so one pass never takes longer than its deadline plus pruning.

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::domain::broadcast::{BroadcastOutcome, ConnectionId, DeliveryOutcome, PaymentEvent};
use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope};
use crate::ports::{ConnectionRegistry, ConnectionRegistryError, ConnectionSender, EventHandler};

/// Configuration for a broadcast pass.
#[derive(Debug, Clone)]
pub struct BroadcasterConfig {
    /// Upper bound on waiting for sends in one pass.
    pub pass_timeout: Duration,
}

impl Default for BroadcasterConfig {
    fn default() -> Self {
        Self {
            pass_timeout: Duration::from_secs(5),
        }
    }
}

impl BroadcasterConfig {
    pub fn with_pass_timeout(mut self, timeout: Duration) -> Self {
        self.pass_timeout = timeout;
        self
    }
}

/// Where one connection's attempt ended up in the tally.
enum Tally {
    Delivered,
    Pruned,
    Skipped,
}

pub struct Broadcaster {
    registry: Arc<dyn ConnectionRegistry>,
    sender: Arc<dyn ConnectionSender>,
    config: BroadcasterConfig,
}

impl Broadcaster {
    pub fn new(registry: Arc<dyn ConnectionRegistry>, sender: Arc<dyn ConnectionSender>) -> Self {
        Self::with_config(registry, sender, BroadcasterConfig::default())
    }

    pub fn with_config(
        registry: Arc<dyn ConnectionRegistry>,
        sender: Arc<dyn ConnectionSender>,
        config: BroadcasterConfig,
    ) -> Self {
        Self {
            registry,
            sender,
            config,
        }
    }

    /// Delivers `event` to every connection in a fresh registry snapshot.
    ///
    /// # Errors
    ///
    /// Only a failed snapshot is an error. Per-connection failures are
    /// counted in the outcome.
    pub async fn on_event(
        &self,
        event: &PaymentEvent,
    ) -> Result<BroadcastOutcome, ConnectionRegistryError> {
        let connections = self.registry.snapshot().await?;
        let deadline = Instant::now() + self.config.pass_timeout;

        let attempts = connections
            .iter()
            .map(|connection_id| self.deliver(connection_id, event, deadline));
        let tallies = join_all(attempts).await;

        let mut outcome = BroadcastOutcome::default();
        for tally in tallies {
            match tally {
                Tally::Delivered => outcome.delivered += 1,
                Tally::Pruned => outcome.pruned += 1,
                Tally::Skipped => outcome.skipped += 1,
            }
        }

        tracing::info!(
            event_id = %event.event_id(),
            event_type = event.event_type(),
            connections = connections.len(),
            delivered = outcome.delivered,
            pruned = outcome.pruned,
            skipped = outcome.skipped,
            "Broadcast pass complete"
        );

        Ok(outcome)
    }

    async fn deliver(
        &self,
        connection_id: &ConnectionId,
        event: &PaymentEvent,
        deadline: Instant,
    ) -> Tally {
        let send = self.sender.send(connection_id, Arc::clone(event.payload()));
        let outcome = tokio::time::timeout_at(deadline, send)
            .await
            .unwrap_or_else(|_| DeliveryOutcome::transient("broadcast pass timed out"));

        match outcome {
            DeliveryOutcome::Ok => Tally::Delivered,
            DeliveryOutcome::TransientError(reason) => {
                tracing::debug!(
                    connection_id = %connection_id,
                    event_id = %event.event_id(),
                    reason = %reason,
                    "Delivery skipped"
                );
                Tally::Skipped
            }
            // Only an explicit Gone prunes; timeouts arrive as TransientError.
            DeliveryOutcome::Gone => match self.registry.unregister(connection_id).await {
                Ok(()) => {
                    tracing::info!(connection_id = %connection_id, "Pruned stale connection");
                    Tally::Pruned
                }
                Err(e) => {
                    tracing::warn!(
                        connection_id = %connection_id,
                        error = %e,
                        "Failed to prune stale connection"
                    );
                    Tally::Skipped
                }
            },
        }
    }
}

#[async_trait]
impl EventHandler for Broadcaster {
    async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError> {
        let event = PaymentEvent::try_from(event)?;
        self.on_event(&event)
            .await
            .map_err(|e| DomainError::new(ErrorCode::RegistryUnavailable, e.to_string()))?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Broadcaster"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::registry::InMemoryConnectionRegistry;
    use crate::domain::broadcast::ConnectionRecord;
    use crate::domain::foundation::Timestamp;
    use crate::domain::webhook::VerificationResult;
    use std::collections::HashMap;
    use std::sync::Mutex;

    // ════════════════════════════════════════════════════════════════════════════
    // Test doubles
    // ════════════════════════════════════════════════════════════════════════════

    /// Sender with a scripted outcome per connection. Unscripted ids succeed.
    #[derive(Default)]
    struct ScriptedSender {
        outcomes: HashMap<ConnectionId, DeliveryOutcome>,
        hang: Vec<ConnectionId>,
        calls: Mutex<Vec<(ConnectionId, Vec<u8>)>>,
        on_first_send: Mutex<Option<Box<dyn FnOnce() + Send>>>,
    }

    impl ScriptedSender {
        fn with(mut self, id: &str, outcome: DeliveryOutcome) -> Self {
            self.outcomes.insert(cid(id), outcome);
            self
        }

        fn hanging(mut self, id: &str) -> Self {
            self.hang.push(cid(id));
            self
        }

        fn called_ids(&self) -> Vec<ConnectionId> {
            let mut ids: Vec<_> = self.calls.lock().unwrap().iter().map(|(id, _)| id.clone()).collect();
            ids.sort();
            ids
        }
    }

    #[async_trait]
    impl ConnectionSender for ScriptedSender {
        async fn send(&self, connection_id: &ConnectionId, payload: Arc<[u8]>) -> DeliveryOutcome {
            if let Some(hook) = self.on_first_send.lock().unwrap().take() {
                hook();
            }
            self.calls
                .lock()
                .unwrap()
                .push((connection_id.clone(), payload.to_vec()));
            if self.hang.contains(connection_id) {
                std::future::pending::<()>().await;
            }
            self.outcomes
                .get(connection_id)
                .cloned()
                .unwrap_or(DeliveryOutcome::Ok)
        }
    }

    /// Registry whose unregister always fails.
    struct StickyRegistry(InMemoryConnectionRegistry);

    #[async_trait]
    impl ConnectionRegistry for StickyRegistry {
        async fn register(&self, id: &ConnectionId) -> Result<ConnectionRecord, ConnectionRegistryError> {
            self.0.register(id).await
        }

        async fn unregister(&self, _id: &ConnectionId) -> Result<(), ConnectionRegistryError> {
            Err(ConnectionRegistryError::Redis("connection refused".into()))
        }

        async fn snapshot(&self) -> Result<Vec<ConnectionId>, ConnectionRegistryError> {
            self.0.snapshot().await
        }

        async fn get(&self, id: &ConnectionId) -> Result<Option<ConnectionRecord>, ConnectionRegistryError> {
            self.0.get(id).await
        }
    }

    fn cid(s: &str) -> ConnectionId {
        ConnectionId::parse(s).unwrap()
    }

    fn event() -> PaymentEvent {
        PaymentEvent::from_verification(
            VerificationResult::Accepted {
                event_type: "invoice.paid".to_string(),
                canonical_payload: br#"{"test":"ok"}"#.to_vec(),
            },
            Timestamp::now(),
        )
        .unwrap()
    }

    async fn registry_with(ids: &[&str]) -> Arc<InMemoryConnectionRegistry> {
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        for id in ids {
            registry.register(&cid(id)).await.unwrap();
        }
        registry
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Delivery
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn sends_exactly_once_per_snapshot_connection() {
        let registry = registry_with(&["c1", "c2", "c3"]).await;
        let sender = Arc::new(ScriptedSender::default());
        let broadcaster = Broadcaster::new(registry, sender.clone());

        let outcome = broadcaster.on_event(&event()).await.unwrap();

        assert_eq!(outcome.delivered, 3);
        assert_eq!(sender.called_ids(), vec![cid("c1"), cid("c2"), cid("c3")]);
        for (_, payload) in sender.calls.lock().unwrap().iter() {
            assert_eq!(payload.as_slice(), br#"{"test":"ok"}"#);
        }
    }

    #[tokio::test]
    async fn empty_registry_is_a_quiet_pass() {
        let registry = registry_with(&[]).await;
        let sender = Arc::new(ScriptedSender::default());
        let broadcaster = Broadcaster::new(registry, sender.clone());

        let outcome = broadcaster.on_event(&event()).await.unwrap();

        assert_eq!(outcome, BroadcastOutcome::default());
        assert!(sender.called_ids().is_empty());
    }

    #[tokio::test]
    async fn connection_registered_after_snapshot_is_not_sent_to() {
        let registry = registry_with(&["c1", "c2"]).await;
        let late_registry = registry.clone();
        let sender = ScriptedSender::default();
        *sender.on_first_send.lock().unwrap() = Some(Box::new(move || {
            let registry = late_registry.clone();
            tokio::spawn(async move { registry.register(&cid("c9")).await });
        }));
        let sender = Arc::new(sender);
        let broadcaster = Broadcaster::new(registry.clone(), sender.clone());

        broadcaster.on_event(&event()).await.unwrap();
        tokio::task::yield_now().await;

        assert_eq!(sender.called_ids(), vec![cid("c1"), cid("c2")]);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Pruning
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn gone_connection_is_pruned_and_others_remain() {
        let registry = registry_with(&["c1", "c2"]).await;
        let sender = Arc::new(ScriptedSender::default().with("c2", DeliveryOutcome::Gone));
        let broadcaster = Broadcaster::new(registry.clone(), sender);

        let outcome = broadcaster.on_event(&event()).await.unwrap();

        assert_eq!(outcome, BroadcastOutcome { delivered: 1, pruned: 1, skipped: 0 });
        assert_eq!(registry.snapshot().await.unwrap(), vec![cid("c1")]);
    }

    #[tokio::test]
    async fn transient_failure_is_skipped_not_pruned() {
        let registry = registry_with(&["c1", "c2"]).await;
        let sender = Arc::new(
            ScriptedSender::default().with("c1", DeliveryOutcome::transient("queue full")),
        );
        let broadcaster = Broadcaster::new(registry.clone(), sender);

        let outcome = broadcaster.on_event(&event()).await.unwrap();

        assert_eq!(outcome, BroadcastOutcome { delivered: 1, pruned: 0, skipped: 1 });
        assert_eq!(registry.snapshot().await.unwrap(), vec![cid("c1"), cid("c2")]);
    }

    #[tokio::test]
    async fn slow_connection_times_out_without_blocking_or_pruning() {
        let registry = registry_with(&["c1", "c2"]).await;
        let sender = Arc::new(ScriptedSender::default().hanging("c1"));
        let broadcaster = Broadcaster::with_config(
            registry.clone(),
            sender,
            BroadcasterConfig::default().with_pass_timeout(Duration::from_millis(50)),
        );

        let outcome = tokio::time::timeout(Duration::from_secs(2), broadcaster.on_event(&event()))
            .await
            .expect("pass should end at its deadline")
            .unwrap();

        assert_eq!(outcome, BroadcastOutcome { delivered: 1, pruned: 0, skipped: 1 });
        assert_eq!(registry.snapshot().await.unwrap(), vec![cid("c1"), cid("c2")]);
    }

    #[tokio::test]
    async fn failed_prune_counts_as_skipped() {
        let registry = Arc::new(StickyRegistry(InMemoryConnectionRegistry::new()));
        registry.register(&cid("c1")).await.unwrap();
        let sender = Arc::new(ScriptedSender::default().with("c1", DeliveryOutcome::Gone));
        let broadcaster = Broadcaster::new(registry.clone(), sender);

        let outcome = broadcaster.on_event(&event()).await.unwrap();

        assert_eq!(outcome, BroadcastOutcome { delivered: 0, pruned: 0, skipped: 1 });
        assert_eq!(registry.snapshot().await.unwrap(), vec![cid("c1")]);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // EventHandler seam
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn handle_decodes_envelope_and_broadcasts() {
        let registry = registry_with(&["c1"]).await;
        let sender = Arc::new(ScriptedSender::default());
        let broadcaster = Broadcaster::new(registry, sender.clone());

        broadcaster.handle(event().to_envelope()).await.unwrap();

        assert_eq!(sender.called_ids(), vec![cid("c1")]);
        assert_eq!(broadcaster.name(), "Broadcaster");
    }

    #[tokio::test]
    async fn handle_refuses_envelope_without_type() {
        let registry = registry_with(&["c1"]).await;
        let sender = Arc::new(ScriptedSender::default());
        let broadcaster = Broadcaster::new(registry, sender.clone());
        let envelope = EventEnvelope::new("", Timestamp::now(), b"{}".to_vec());

        assert!(broadcaster.handle(envelope).await.is_err());
        assert!(sender.called_ids().is_empty());
    }
}
