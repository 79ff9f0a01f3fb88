//! EventSubscriber port - Interface for consuming events from the channel.
//!
//! The broadcaster registers as an `EventHandler`; the subscriber adapter
//! drives it one envelope at a time.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;

use crate::domain::foundation::{DomainError, EventEnvelope};

/// Handler for processing channel events.
///
/// Implementations should be:
/// - **Idempotent** - The channel is at-least-once, so redelivery happens
/// - **Isolated** - A failing event must not stop the subscriber loop
///
/// # Example
///
/// ```ignore
/// #[async_trait]
/// impl EventHandler for Broadcaster {
///     async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError> {
///         let event = PaymentEvent::try_from(event)?;
///         self.on_event(&event).await;
///         Ok(())
///     }
///
///     fn name(&self) -> &'static str {
///         "Broadcaster"
///     }
/// }
/// ```
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Process one event.
    async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError>;

    /// Handler name for logging.
    fn name(&self) -> &'static str;
}

/// Errors that end a subscriber loop.
#[derive(Debug, thiserror::Error)]
pub enum SubscribeError {
    /// The channel could not be reached or dropped the subscription.
    #[error("Channel unavailable: {0}")]
    ChannelUnavailable(String),
}

/// Port for consuming the event channel.
///
/// `run` returns `Ok(())` once `shutdown` flips to `true` (or its sender is
/// dropped). Handler errors are logged and do not end the loop.
#[async_trait]
pub trait EventSubscriber: Send + Sync {
    async fn run(
        &self,
        handler: Arc<dyn EventHandler>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<(), SubscribeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time check that traits are object-safe
    #[allow(dead_code)]
    fn assert_handler_object_safe(_: &dyn EventHandler) {}

    #[allow(dead_code)]
    fn assert_subscriber_object_safe(_: &dyn EventSubscriber) {}

    #[test]
    fn subscribe_error_displays_reason() {
        let err = SubscribeError::ChannelUnavailable("connection reset".into());
        assert_eq!(err.to_string(), "Channel unavailable: connection reset");
    }
}
