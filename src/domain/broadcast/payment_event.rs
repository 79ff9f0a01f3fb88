//! The verified event fanned out to live connections.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, EventEnvelope, EventId, Timestamp};
use crate::domain::webhook::{VerificationError, VerificationResult};

/// A verified payment event.
///
/// Only constructed from an `Accepted` verification result, or decoded from
/// an envelope that was published from one. The payload is shared read-only
/// across every concurrent delivery of a broadcast pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentEvent {
    event_id: EventId,
    event_type: String,
    payload: Arc<[u8]>,
    received_at: Timestamp,
}

impl PaymentEvent {
    /// Builds an event from a verification outcome.
    ///
    /// # Errors
    ///
    /// A rejected request yields its rejection reason.
    pub fn from_verification(
        result: VerificationResult,
        received_at: Timestamp,
    ) -> Result<Self, VerificationError> {
        match result {
            VerificationResult::Accepted {
                event_type,
                canonical_payload,
            } => Ok(Self {
                event_id: EventId::new(),
                event_type,
                payload: Arc::from(canonical_payload),
                received_at,
            }),
            VerificationResult::Rejected { reason } => Err(reason),
        }
    }

    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn payload(&self) -> &Arc<[u8]> {
        &self.payload
    }

    pub fn received_at(&self) -> Timestamp {
        self.received_at
    }

    /// Wraps the event for the pub/sub channel.
    pub fn to_envelope(&self) -> EventEnvelope {
        EventEnvelope {
            event_id: self.event_id.clone(),
            event_type: self.event_type.clone(),
            occurred_at: self.received_at,
            payload: self.payload.to_vec(),
            metadata: Default::default(),
        }
    }
}

impl TryFrom<EventEnvelope> for PaymentEvent {
    type Error = DomainError;

    fn try_from(envelope: EventEnvelope) -> Result<Self, Self::Error> {
        if envelope.event_type.is_empty() {
            return Err(DomainError::validation("event_type", "event type cannot be empty"));
        }
        Ok(Self {
            event_id: envelope.event_id,
            event_type: envelope.event_type,
            payload: Arc::from(envelope.payload),
            received_at: envelope.occurred_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accepted() -> VerificationResult {
        VerificationResult::Accepted {
            event_type: "invoice.paid".to_string(),
            canonical_payload: br#"{"test":"ok"}"#.to_vec(),
        }
    }

    #[test]
    fn built_from_accepted_result() {
        let at = Timestamp::now();
        let event = PaymentEvent::from_verification(accepted(), at).unwrap();

        assert_eq!(event.event_type(), "invoice.paid");
        assert_eq!(&event.payload()[..], br#"{"test":"ok"}"#);
        assert_eq!(event.received_at(), at);
    }

    #[test]
    fn rejected_result_yields_no_event() {
        let result = VerificationResult::Rejected {
            reason: VerificationError::SignatureMismatch,
        };

        assert_eq!(
            PaymentEvent::from_verification(result, Timestamp::now()),
            Err(VerificationError::SignatureMismatch)
        );
    }

    #[test]
    fn envelope_round_trip_preserves_identity_and_bytes() {
        let event = PaymentEvent::from_verification(accepted(), Timestamp::now()).unwrap();

        let restored = PaymentEvent::try_from(event.to_envelope()).unwrap();

        assert_eq!(restored, event);
    }

    #[test]
    fn envelope_without_type_is_refused() {
        let envelope = EventEnvelope::new("", Timestamp::now(), vec![]);

        assert!(PaymentEvent::try_from(envelope).is_err());
    }

    #[test]
    fn clones_share_payload() {
        let event = PaymentEvent::from_verification(accepted(), Timestamp::now()).unwrap();
        let copy = event.clone();

        assert!(Arc::ptr_eq(event.payload(), copy.payload()));
    }
}
