//! EventPublisher port - Interface for handing verified events to the channel.
//!
//! The ingest path publishes through this port without knowing about the
//! underlying transport (in-memory queue, Redis pub/sub, etc.).

use async_trait::async_trait;
use http::StatusCode;

use crate::domain::foundation::EventEnvelope;

/// Errors surfaced synchronously to the ingest path.
///
/// Every variant maps to a 5xx so the provider re-delivers the webhook.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PublishError {
    #[error("Channel unavailable: {0}")]
    ChannelUnavailable(String),

    #[error("Channel quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PublishError {
    /// HTTP status returned to the webhook sender.
    pub fn status_code(&self) -> StatusCode {
        match self {
            PublishError::ChannelUnavailable(_) | PublishError::QuotaExceeded(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            PublishError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Port for publishing verified payment events.
///
/// Implementations must ensure:
/// - Events are delivered at-least-once (subscribers may see duplicates)
/// - Failures are returned to the caller, never dropped silently
///
/// # Example
///
/// ```ignore
/// let envelope = event.to_envelope();
/// publisher.publish(envelope).await?;
/// ```
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a single event envelope.
    async fn publish(&self, event: EventEnvelope) -> Result<(), PublishError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time check that trait is object-safe
    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn EventPublisher) {}

    #[test]
    fn every_publish_error_is_server_side() {
        let errors = [
            PublishError::ChannelUnavailable("down".into()),
            PublishError::QuotaExceeded("full".into()),
            PublishError::Serialization("bad".into()),
        ];
        for error in errors {
            assert!(error.status_code().is_server_error(), "{error}");
        }
    }

    #[test]
    fn unavailable_channel_maps_to_503() {
        assert_eq!(
            PublishError::ChannelUnavailable("down".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
