//! Live connection identity and registry record.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, Timestamp};

/// Opaque identifier of a live connection, assigned by the transport.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Mints a fresh id for a connection this process terminates.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accepts a transport-assigned id.
    ///
    /// # Errors
    ///
    /// Rejects blank ids.
    pub fn parse(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::validation(
                "connection_id",
                "connection id cannot be empty",
            ));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registry entry for one live connection.
///
/// `registered_at` is fixed by the first registration; repeated registrations
/// only move `last_seen_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub connection_id: ConnectionId,
    pub registered_at: Timestamp,
    pub last_seen_at: Option<Timestamp>,
}

impl ConnectionRecord {
    /// A record as created by the first registration.
    pub fn new(connection_id: ConnectionId, registered_at: Timestamp) -> Self {
        Self {
            connection_id,
            registered_at,
            last_seen_at: Some(registered_at),
        }
    }

    /// Applies a repeated registration.
    pub fn touch(&mut self, seen_at: Timestamp) {
        self.last_seen_at = Some(seen_at);
    }
}
