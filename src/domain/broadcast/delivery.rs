//! Per-connection delivery results and the per-event tally.

use serde::Serialize;

/// Result of one `send(connection, bytes)` attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Handed to the connection.
    Ok,
    /// The connection no longer exists; its registry entry is stale.
    Gone,
    /// Delivery failed for now (slow, full, timed out). The connection is kept.
    TransientError(String),
}

impl DeliveryOutcome {
    pub fn transient(reason: impl Into<String>) -> Self {
        DeliveryOutcome::TransientError(reason.into())
    }
}

/// Counts for one broadcast pass. Observability only, never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastOutcome {
    pub delivered: usize,
    /// Connections that reported gone and were removed from the registry.
    pub pruned: usize,
    /// Connections that failed transiently and were kept.
    pub skipped: usize,
}

impl BroadcastOutcome {
    /// Total attempts accounted for.
    pub fn attempted(&self) -> usize {
        self.delivered + self.pruned + self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempted_sums_all_buckets() {
        let outcome = BroadcastOutcome {
            delivered: 3,
            pruned: 1,
            skipped: 2,
        };
        assert_eq!(outcome.attempted(), 6);
    }

    #[test]
    fn serializes_counts() {
        let outcome = BroadcastOutcome {
            delivered: 1,
            pruned: 1,
            skipped: 0,
        };
        let json = serde_json::to_value(outcome).unwrap();
        assert_eq!(json, serde_json::json!({"delivered": 1, "pruned": 1, "skipped": 0}));
    }

    #[test]
    fn transient_keeps_reason() {
        assert_eq!(
            DeliveryOutcome::transient("queue full"),
            DeliveryOutcome::TransientError("queue full".to_string())
        );
    }
}
