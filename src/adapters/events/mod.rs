//! Event channel adapters.
//!
//! Adapters implement the event publishing and subscribing ports
//! for different environments:
//!
//! - `InMemoryEventChannel` - Bounded in-process queue for tests and single-node runs
//! - `RedisEventChannel` - Redis PUBLISH / SUBSCRIBE for multi-instance deployments

mod in_memory;
mod redis_channel;

pub use in_memory::InMemoryEventChannel;
pub use redis_channel::RedisEventChannel;

use crate::domain::foundation::EventEnvelope;
use crate::ports::EventHandler;

/// Hands one envelope to the handler. Failures are logged, never propagated,
/// so one bad event cannot stop a subscriber loop.
async fn dispatch(handler: &dyn EventHandler, envelope: EventEnvelope) {
    let event_id = envelope.event_id.clone();
    if let Err(e) = handler.handle(envelope).await {
        tracing::warn!(
            handler = handler.name(),
            event_id = %event_id,
            error = %e,
            "Event handler failed"
        );
    }
}
