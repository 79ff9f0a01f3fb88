//! Application handlers.
//!
//! Handlers that orchestrate domain operations across ports.

pub mod broadcast_event;
pub mod connection_lifecycle;
pub mod ingest_webhook;

pub use broadcast_event::{Broadcaster, BroadcasterConfig};
pub use connection_lifecycle::ConnectionLifecycle;
pub use ingest_webhook::{IngestOutcome, IngestWebhookCommand, WebhookIngestHandler};
