//! Application layer - Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports:
//! webhook ingest on the write side, broadcast and connection lifecycle on
//! the delivery side.

pub mod handlers;

pub use handlers::{
    Broadcaster, BroadcasterConfig, ConnectionLifecycle, IngestOutcome, IngestWebhookCommand,
    WebhookIngestHandler,
};
