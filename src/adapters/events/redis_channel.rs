//! Redis pub/sub event channel for multi-instance deployments.
//!
//! Every instance publishes verified webhooks with `PUBLISH` and runs one
//! `SUBSCRIBE` loop on the same channel, so each event reaches every instance
//! and each instance fans out to the connections it terminates.

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::sync::Arc;
use tokio::sync::watch;

use crate::domain::foundation::EventEnvelope;
use crate::ports::{EventHandler, EventPublisher, EventSubscriber, PublishError, SubscribeError};

use super::dispatch;

/// Redis-backed channel implementing both channel ports.
#[derive(Clone)]
pub struct RedisEventChannel {
    client: redis::Client,
    conn: MultiplexedConnection,
    channel: String,
}

impl RedisEventChannel {
    /// Create a channel bound to `channel`.
    ///
    /// `conn` is used for publishing; subscriptions open their own
    /// connection from `client`.
    pub fn new(client: redis::Client, conn: MultiplexedConnection, channel: impl Into<String>) -> Self {
        Self {
            client,
            conn,
            channel: channel.into(),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }
}

#[async_trait]
impl EventPublisher for RedisEventChannel {
    async fn publish(&self, event: EventEnvelope) -> Result<(), PublishError> {
        let bytes = event
            .to_json_bytes()
            .map_err(|e| PublishError::Serialization(e.to_string()))?;

        let mut conn = self.conn.clone();
        let receivers: i64 = conn
            .publish(&self.channel, bytes)
            .await
            .map_err(|e: redis::RedisError| PublishError::ChannelUnavailable(e.to_string()))?;
        require_subscriber(&self.channel, receivers)?;

        tracing::debug!(
            event_id = %event.event_id,
            channel = %self.channel,
            receivers,
            "Published event"
        );
        Ok(())
    }
}

/// Pub/sub keeps nothing for absent subscribers, so a message nobody
/// received is lost and must fail the publish.
fn require_subscriber(channel: &str, receivers: i64) -> Result<(), PublishError> {
    if receivers <= 0 {
        return Err(PublishError::ChannelUnavailable(format!(
            "no subscriber on channel {}",
            channel
        )));
    }
    Ok(())
}

#[async_trait]
impl EventSubscriber for RedisEventChannel {
    async fn run(
        &self,
        handler: Arc<dyn EventHandler>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), SubscribeError> {
        let mut pubsub = self
            .client
            .get_async_connection()
            .await
            .map_err(|e| SubscribeError::ChannelUnavailable(e.to_string()))?
            .into_pubsub();
        pubsub
            .subscribe(&self.channel)
            .await
            .map_err(|e| SubscribeError::ChannelUnavailable(e.to_string()))?;

        tracing::info!(channel = %self.channel, handler = handler.name(), "Subscribed to event channel");

        let mut messages = pubsub.on_message();

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

                next = messages.next() => {
                    let Some(message) = next else {
                        return Err(SubscribeError::ChannelUnavailable(
                            "subscription stream ended".to_string(),
                        ));
                    };

                    match EventEnvelope::from_json_slice(message.get_payload_bytes()) {
                        Ok(envelope) => dispatch(handler.as_ref(), envelope).await,
                        Err(e) => {
                            tracing::warn!(channel = %self.channel, error = %e, "Dropping undecodable event");
                        }
                    }
                }
            }
        }
    }
}
