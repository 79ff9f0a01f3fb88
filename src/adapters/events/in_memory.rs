//! In-memory event channel for tests and single-node runs.
//!
//! A bounded `tokio::mpsc` queue stands in for the pub/sub channel. Publishing
//! never blocks: a full queue is reported as a quota failure so the ingest
//! path can answer 5xx and let the provider retry.
//!
//! # Security Note
//!
//! Test helpers use `.expect()` on lock operations which will panic if locks
//! are poisoned. Production deployments should use `RedisEventChannel`.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use tokio::sync::{mpsc, watch, Mutex};

use crate::domain::foundation::EventEnvelope;
use crate::ports::{EventHandler, EventPublisher, EventSubscriber, PublishError, SubscribeError};

use super::dispatch;

/// Bounded in-process channel implementing both channel ports.
///
/// # Example
///
/// ```ignore
/// let channel = Arc::new(InMemoryEventChannel::new(64));
///
/// channel.publish(envelope).await?;
///
/// assert_eq!(channel.event_count(), 1);
/// assert!(channel.has_event("invoice.paid"));
/// ```
pub struct InMemoryEventChannel {
    sender: mpsc::Sender<EventEnvelope>,
    receiver: Mutex<mpsc::Receiver<EventEnvelope>>,
    published: RwLock<Vec<EventEnvelope>>,
}

impl InMemoryEventChannel {
    /// Creates a channel holding at most `capacity` undelivered events.
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            sender,
            receiver: Mutex::new(receiver),
            published: RwLock::new(Vec::new()),
        }
    }

    /// Takes the next queued envelope without blocking.
    ///
    /// Returns `None` when the queue is empty or a subscriber loop holds it.
    pub fn try_next(&self) -> Option<EventEnvelope> {
        self.receiver.try_lock().ok()?.try_recv().ok()
    }

    // === Test Helpers ===

    /// Returns all successfully published events.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn published_events(&self) -> Vec<EventEnvelope> {
        self.published
            .read()
            .expect("InMemoryEventChannel: published lock poisoned")
            .clone()
    }

    /// Returns count of successfully published events.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn event_count(&self) -> usize {
        self.published
            .read()
            .expect("InMemoryEventChannel: published lock poisoned")
            .len()
    }

    /// Checks if a specific event type was published.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn has_event(&self, event_type: &str) -> bool {
        self.published
            .read()
            .expect("InMemoryEventChannel: published lock poisoned")
            .iter()
            .any(|e| e.event_type == event_type)
    }
}

impl Default for InMemoryEventChannel {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventChannel {
    async fn publish(&self, event: EventEnvelope) -> Result<(), PublishError> {
        let record = event.clone();
        self.sender.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                PublishError::QuotaExceeded("in-memory channel is full".to_string())
            }
            mpsc::error::TrySendError::Closed(_) => {
                PublishError::ChannelUnavailable("in-memory channel is closed".to_string())
            }
        })?;

        self.published
            .write()
            .expect("InMemoryEventChannel: published write lock poisoned")
            .push(record);
        Ok(())
    }
}

#[async_trait]
impl EventSubscriber for InMemoryEventChannel {
    async fn run(
        &self,
        handler: Arc<dyn EventHandler>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), SubscribeError> {
        let mut receiver = self.receiver.lock().await;

        loop {
            if *shutdown.borrow() {
                return Ok(());
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        return Ok(());
                    }
                }

                next = receiver.recv() => match next {
                    Some(envelope) => dispatch(handler.as_ref(), envelope).await,
                    None => {
                        return Err(SubscribeError::ChannelUnavailable(
                            "in-memory channel closed".to_string(),
                        ))
                    }
                },
            }
        }
    }
}
