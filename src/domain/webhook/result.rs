//! Outcome of verifying one inbound webhook.

use super::errors::VerificationError;

/// Tagged verification outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResult {
    /// The request is authentic.
    Accepted {
        event_type: String,
        /// The exact bytes the signature was computed over. Never re-serialized.
        canonical_payload: Vec<u8>,
    },
    /// The request failed a check. The reason is for internal logging only.
    Rejected { reason: VerificationError },
}

impl VerificationResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, VerificationResult::Accepted { .. })
    }

    /// The rejection reason, if any.
    pub fn rejection(&self) -> Option<&VerificationError> {
        match self {
            VerificationResult::Rejected { reason } => Some(reason),
            VerificationResult::Accepted { .. } => None,
        }
    }
}

impl From<VerificationError> for VerificationResult {
    fn from(reason: VerificationError) -> Self {
        VerificationResult::Rejected { reason }
    }
}
