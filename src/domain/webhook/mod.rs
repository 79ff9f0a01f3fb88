//! Inbound webhook authenticity.
//!
//! - `InboundWebhookRequest` / `WebhookHeaders` - raw request as received
//! - `SignatureVerifier` - generic HMAC or provider timestamped verification
//! - `VerificationResult` - `Accepted` with canonical payload, or `Rejected`
//! - `VerificationError` - enumerated rejection reasons (logged, never returned)

mod errors;
mod request;
mod result;
mod signature;
mod verifier;

pub use errors::VerificationError;
pub use request::{InboundWebhookRequest, WebhookHeaders};
pub use result::VerificationResult;
pub use signature::{constant_time_compare, hmac_sha256, SignatureHeader};
pub use verifier::{
    SignatureVerifier, VerificationMode, DEFAULT_EVENT_TYPE_HEADER,
    DEFAULT_PROVIDER_SIGNATURE_HEADER, DEFAULT_SIGNATURE_HEADER, DEFAULT_TOLERANCE_SECS,
    FALLBACK_EVENT_TYPE,
};
