//! Event transport primitives.
//!
//! - `EventId` - Unique identifier for events (deduplication on redelivery)
//! - `EventMetadata` - Tracing and correlation context
//! - `EventEnvelope` - Transport wrapper handed to the pub/sub channel

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::{DomainError, ErrorCode, Timestamp};

/// Unique identifier for events.
///
/// Uses a String internally so that ids minted by other producers on the
/// same channel (UUID, ULID, provider ids) round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Creates a new random EventId using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Creates an EventId from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata for tracing and correlation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Request id of the webhook delivery that produced this event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

/// Transport envelope for verified payment events.
///
/// The payload is carried as opaque bytes. On the wire (JSON) it is base64
/// encoded so that non-UTF-8 bodies survive the channel untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique ID for this event instance.
    pub event_id: EventId,

    /// Event type for routing (e.g., "invoice.paid").
    pub event_type: String,

    /// When the webhook carrying this event was received.
    pub occurred_at: Timestamp,

    /// Exact bytes the provider signed.
    #[serde(with = "base64_bytes")]
    pub payload: Vec<u8>,

    /// Tracing and correlation metadata.
    #[serde(default)]
    pub metadata: EventMetadata,
}

impl EventEnvelope {
    /// Creates a new envelope with a fresh event id.
    pub fn new(event_type: impl Into<String>, occurred_at: Timestamp, payload: Vec<u8>) -> Self {
        Self {
            event_id: EventId::new(),
            event_type: event_type.into(),
            occurred_at,
            payload,
            metadata: EventMetadata::default(),
        }
    }

    /// Sets the correlation ID.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.metadata.correlation_id = Some(id.into());
        self
    }

    /// Encodes the envelope for the channel.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, DomainError> {
        serde_json::to_vec(self)
            .map_err(|e| DomainError::new(ErrorCode::InternalError, e.to_string()))
    }

    /// Decodes an envelope received from the channel.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, DomainError> {
        serde_json::from_slice(bytes)
            .map_err(|e| DomainError::new(ErrorCode::MalformedEnvelope, e.to_string()))
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
