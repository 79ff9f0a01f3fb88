//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types that the webhook and
//! broadcast domains build on.

mod errors;
mod events;
mod timestamp;

pub use errors::{DomainError, ErrorCode};
pub use events::{EventEnvelope, EventId, EventMetadata};
pub use timestamp::Timestamp;
