//! Webhook signature verification.
//!
//! Two mutually exclusive schemes, chosen once from configuration:
//!
//! - **Generic HMAC**: hex HMAC-SHA256 of the raw body in a single header
//!   (`X-Signature` by default, optional `sha256=` prefix).
//! - **Provider timestamped**: `t=<unix>,v1=<hex>[,v1=<hex>]` header where each
//!   `v1` is HMAC-SHA256 of `"{t}.{body}"`. Any matching candidate is accepted,
//!   and the timestamp must lie within the tolerance window of the arrival time
//!   to defeat replay of captured requests.
//!
//! Verification is a pure function of the request and configuration: "now" is
//! the request's arrival timestamp.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::errors::VerificationError;
use super::request::InboundWebhookRequest;
use super::result::VerificationResult;
use super::signature::{any_constant_time_match, constant_time_compare, hmac_sha256, SignatureHeader};

/// Default replay window (5 minutes).
pub const DEFAULT_TOLERANCE_SECS: u64 = 300;

/// Default header for generic HMAC mode.
pub const DEFAULT_SIGNATURE_HEADER: &str = "X-Signature";

/// Default header for provider timestamped mode.
pub const DEFAULT_PROVIDER_SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Header the sender may use to name the event type.
pub const DEFAULT_EVENT_TYPE_HEADER: &str = "X-Event-Type";

/// Event type used when neither the header nor the body names one.
pub const FALLBACK_EVENT_TYPE: &str = "payment_event";

/// Which signature scheme is enforced.
pub enum VerificationMode {
    Hmac {
        secret: SecretString,
        header: String,
    },
    ProviderTimestamped {
        secret: SecretString,
        header: String,
        tolerance_secs: u64,
    },
}

impl VerificationMode {
    /// Generic HMAC mode on the default header.
    pub fn hmac(secret: impl Into<String>) -> Self {
        VerificationMode::Hmac {
            secret: SecretString::new(secret.into()),
            header: DEFAULT_SIGNATURE_HEADER.to_string(),
        }
    }

    /// Provider timestamped mode on the default header.
    pub fn provider_timestamped(secret: impl Into<String>, tolerance_secs: u64) -> Self {
        VerificationMode::ProviderTimestamped {
            secret: SecretString::new(secret.into()),
            header: DEFAULT_PROVIDER_SIGNATURE_HEADER.to_string(),
            tolerance_secs,
        }
    }

    /// Overrides the signature header name.
    pub fn with_header(mut self, name: impl Into<String>) -> Self {
        match &mut self {
            VerificationMode::Hmac { header, .. }
            | VerificationMode::ProviderTimestamped { header, .. } => *header = name.into(),
        }
        self
    }

    pub fn name(&self) -> &'static str {
        match self {
            VerificationMode::Hmac { .. } => "hmac",
            VerificationMode::ProviderTimestamped { .. } => "provider_timestamped",
        }
    }

    fn header(&self) -> &str {
        match self {
            VerificationMode::Hmac { header, .. }
            | VerificationMode::ProviderTimestamped { header, .. } => header,
        }
    }
}

impl fmt::Debug for VerificationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationMode")
            .field("mode", &self.name())
            .field("header", &self.header())
            .finish_non_exhaustive()
    }
}

/// Verifies inbound webhooks against the configured scheme.
#[derive(Debug)]
pub struct SignatureVerifier {
    mode: VerificationMode,
    event_type_header: String,
}

impl SignatureVerifier {
    pub fn new(mode: VerificationMode) -> Self {
        Self {
            mode,
            event_type_header: DEFAULT_EVENT_TYPE_HEADER.to_string(),
        }
    }

    pub fn with_event_type_header(mut self, name: impl Into<String>) -> Self {
        self.event_type_header = name.into();
        self
    }

    pub fn mode(&self) -> &VerificationMode {
        &self.mode
    }

    /// Verifies a request.
    ///
    /// On success the canonical payload is the request body, byte for byte.
    pub fn verify(&self, request: &InboundWebhookRequest) -> VerificationResult {
        match self.check(request) {
            Ok(()) => VerificationResult::Accepted {
                event_type: self.resolve_event_type(request),
                canonical_payload: request.body().to_vec(),
            },
            Err(reason) => VerificationResult::Rejected { reason },
        }
    }

    fn check(&self, request: &InboundWebhookRequest) -> Result<(), VerificationError> {
        let header_name = self.mode.header();
        let header_value = request
            .headers()
            .get_non_empty(header_name)
            .ok_or_else(|| VerificationError::MissingHeader(header_name.to_string()))?;

        match &self.mode {
            VerificationMode::Hmac { secret, .. } => {
                verify_hmac(secret.expose_secret().as_bytes(), request.body(), header_value)
            }
            VerificationMode::ProviderTimestamped {
                secret,
                tolerance_secs,
                ..
            } => verify_provider(
                secret.expose_secret().as_bytes(),
                request,
                header_value,
                *tolerance_secs,
            ),
        }
    }

    /// Header first, then (provider mode only) the body's `type` field.
    fn resolve_event_type(&self, request: &InboundWebhookRequest) -> String {
        if let Some(event_type) = request.headers().get_non_empty(&self.event_type_header) {
            return event_type.to_string();
        }

        if let VerificationMode::ProviderTimestamped { .. } = self.mode {
            #[derive(Deserialize)]
            struct TypeField {
                #[serde(rename = "type")]
                event_type: String,
            }

            if let Ok(field) = serde_json::from_slice::<TypeField>(request.body()) {
                if !field.event_type.is_empty() {
                    return field.event_type;
                }
            }
        }

        FALLBACK_EVENT_TYPE.to_string()
    }
}

fn verify_hmac(secret: &[u8], body: &[u8], header_value: &str) -> Result<(), VerificationError> {
    let supplied_hex = header_value.strip_prefix("sha256=").unwrap_or(header_value);
    let supplied = hex::decode(supplied_hex).map_err(|_| VerificationError::SignatureMismatch)?;

    let expected = hmac_sha256(secret, &[body]);
    if !constant_time_compare(&expected, &supplied) {
        return Err(VerificationError::SignatureMismatch);
    }
    Ok(())
}

fn verify_provider(
    secret: &[u8],
    request: &InboundWebhookRequest,
    header_value: &str,
    tolerance_secs: u64,
) -> Result<(), VerificationError> {
    let header = SignatureHeader::parse(header_value)?;

    let expected = hmac_sha256(
        secret,
        &[header.timestamp_raw.as_bytes(), b".", request.body()],
    );
    if !any_constant_time_match(&expected, &header.v1_signatures) {
        return Err(VerificationError::SignatureMismatch);
    }

    let now = request.received_at().as_unix_secs();
    let within_tolerance = now
        .checked_sub(header.timestamp)
        .map(|skew| skew.unsigned_abs() <= tolerance_secs)
        .unwrap_or(false);
    if !within_tolerance {
        return Err(VerificationError::TimestampOutOfTolerance);
    }

    Ok(())
}
