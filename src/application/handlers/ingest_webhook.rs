//! WebhookIngestHandler - verifies an inbound webhook and publishes it.
//!
//! Per request:
//!
//! ```text
//! Received -> Verifying -> Rejected
//!                       -> Verified -> Publishing -> PublishOk
//!                                                 -> PublishFailed
//! ```

use http::StatusCode;
use std::sync::Arc;

use crate::domain::broadcast::PaymentEvent;
use crate::domain::foundation::EventId;
use crate::domain::webhook::{InboundWebhookRequest, SignatureVerifier, VerificationError};
use crate::ports::{EventPublisher, PublishError};

/// Command to ingest one webhook delivery.
#[derive(Debug, Clone)]
pub struct IngestWebhookCommand {
    pub request: InboundWebhookRequest,
    /// Request id of the HTTP delivery, carried into the envelope metadata.
    pub correlation_id: Option<String>,
}

impl IngestWebhookCommand {
    pub fn new(request: InboundWebhookRequest) -> Self {
        Self {
            request,
            correlation_id: None,
        }
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }
}

/// Terminal state of one ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Verification failed. The reason is for logs only.
    Rejected(VerificationError),
    /// Verified and handed to the channel.
    Published { event_id: EventId, event_type: String },
    /// Verified but the channel refused it; the provider should retry.
    PublishFailed(PublishError),
}

impl IngestOutcome {
    /// Status code returned to the webhook sender.
    pub fn status_code(&self) -> StatusCode {
        match self {
            IngestOutcome::Rejected(reason) => reason.status_code(),
            IngestOutcome::Published { .. } => StatusCode::OK,
            IngestOutcome::PublishFailed(error) => error.status_code(),
        }
    }
}

/// Glue between the verifier and the event channel.
pub struct WebhookIngestHandler {
    verifier: Arc<SignatureVerifier>,
    publisher: Arc<dyn EventPublisher>,
}

impl WebhookIngestHandler {
    pub fn new(verifier: Arc<SignatureVerifier>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            verifier,
            publisher,
        }
    }

    pub async fn handle(&self, cmd: IngestWebhookCommand) -> IngestOutcome {
        let received_at = cmd.request.received_at();
        let result = self.verifier.verify(&cmd.request);

        let event = match PaymentEvent::from_verification(result, received_at) {
            Ok(event) => event,
            Err(reason) => {
                tracing::warn!(
                    mode = self.verifier.mode().name(),
                    reason = %reason,
                    kind = reason.kind(),
                    "Webhook rejected"
                );
                return IngestOutcome::Rejected(reason);
            }
        };

        let mut envelope = event.to_envelope();
        if let Some(correlation_id) = cmd.correlation_id {
            envelope = envelope.with_correlation_id(correlation_id);
        }

        match self.publisher.publish(envelope).await {
            Ok(()) => {
                tracing::info!(
                    event_id = %event.event_id(),
                    event_type = event.event_type(),
                    bytes = event.payload().len(),
                    "Webhook published"
                );
                IngestOutcome::Published {
                    event_id: event.event_id().clone(),
                    event_type: event.event_type().to_string(),
                }
            }
            Err(error) => {
                tracing::error!(
                    event_id = %event.event_id(),
                    error = %error,
                    "Failed to publish verified webhook"
                );
                IngestOutcome::PublishFailed(error)
            }
        }
    }
}
