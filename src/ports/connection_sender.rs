//! ConnectionSender port - the transport's per-connection send primitive.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::broadcast::{ConnectionId, DeliveryOutcome};

/// Delivers bytes to one live connection.
///
/// Never fails with an error: every attempt resolves to one of the three
/// delivery outcomes, and the broadcaster decides what each one means for
/// the registry.
#[async_trait]
pub trait ConnectionSender: Send + Sync {
    async fn send(&self, connection_id: &ConnectionId, payload: Arc<[u8]>) -> DeliveryOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn ConnectionSender) {}
}
