//! Verification error types for inbound webhooks.
//!
//! The variants are for internal logging only. Callers of the HTTP surface
//! see a single generic rejection regardless of which check failed.

use http::StatusCode;
use thiserror::Error;

/// Reasons a webhook failed authenticity checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// The configured signature header was absent or blank.
    #[error("Missing signature header: {0}")]
    MissingHeader(String),

    /// No supplied signature matched the computed HMAC.
    #[error("Signature mismatch")]
    SignatureMismatch,

    /// Signed timestamp is further from the arrival time than the tolerance.
    #[error("Timestamp outside tolerance window")]
    TimestampOutOfTolerance,

    /// The signature header could not be parsed.
    #[error("Malformed signature header: {0}")]
    MalformedHeader(&'static str),
}

impl VerificationError {
    /// Every verification failure maps to the same status so the response
    /// does not reveal which check failed.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    /// Stable label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            VerificationError::MissingHeader(_) => "missing_header",
            VerificationError::SignatureMismatch => "signature_mismatch",
            VerificationError::TimestampOutOfTolerance => "timestamp_out_of_tolerance",
            VerificationError::MalformedHeader(_) => "malformed_header",
        }
    }
}
