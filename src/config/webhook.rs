//! Webhook verification configuration

use serde::Deserialize;
use std::fmt;

use crate::domain::webhook::{
    SignatureVerifier, VerificationMode, DEFAULT_EVENT_TYPE_HEADER,
    DEFAULT_PROVIDER_SIGNATURE_HEADER, DEFAULT_SIGNATURE_HEADER, DEFAULT_TOLERANCE_SECS,
};

use super::error::ValidationError;

/// Verification scheme selector
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WebhookMode {
    Hmac,
    ProviderTimestamped,
}

/// Webhook verification configuration
#[derive(Clone, Deserialize)]
pub struct WebhookConfig {
    /// Explicit scheme. When absent the configured secret decides.
    pub mode: Option<WebhookMode>,

    /// Shared secret for generic HMAC mode
    pub signing_secret: Option<String>,

    /// Endpoint secret for provider-timestamped mode
    pub provider_endpoint_secret: Option<String>,

    /// Replay window in seconds
    #[serde(default = "default_tolerance_secs")]
    pub tolerance_secs: u64,

    #[serde(default = "default_signature_header")]
    pub signature_header: String,

    #[serde(default = "default_provider_signature_header")]
    pub provider_signature_header: String,

    #[serde(default = "default_event_type_header")]
    pub event_type_header: String,
}

impl WebhookConfig {
    /// Resolve the verification mode.
    ///
    /// An explicit `mode` requires its own secret. Otherwise the provider
    /// endpoint secret wins over the generic signing secret. Neither secret
    /// is an error; there is no unauthenticated fallback.
    pub fn verification_mode(&self) -> Result<VerificationMode, ValidationError> {
        let signing = non_blank(&self.signing_secret);
        let provider = non_blank(&self.provider_endpoint_secret);

        let mode = match (self.mode, signing, provider) {
            (Some(WebhookMode::Hmac), Some(secret), _) | (None, Some(secret), None) => {
                VerificationMode::hmac(secret).with_header(&self.signature_header)
            }
            (Some(WebhookMode::ProviderTimestamped), _, Some(secret)) | (None, _, Some(secret)) => {
                VerificationMode::provider_timestamped(secret, self.tolerance_secs)
                    .with_header(&self.provider_signature_header)
            }
            (Some(WebhookMode::Hmac), None, _) => {
                return Err(ValidationError::MissingRequired(
                    "PAYMENT_FANOUT__WEBHOOK__SIGNING_SECRET",
                ))
            }
            (Some(WebhookMode::ProviderTimestamped), _, None) => {
                return Err(ValidationError::MissingRequired(
                    "PAYMENT_FANOUT__WEBHOOK__PROVIDER_ENDPOINT_SECRET",
                ))
            }
            (None, None, None) => return Err(ValidationError::NoWebhookSecretConfigured),
        };

        Ok(mode)
    }

    /// Build the verifier described by this configuration.
    pub fn verifier(&self) -> Result<SignatureVerifier, ValidationError> {
        Ok(SignatureVerifier::new(self.verification_mode()?)
            .with_event_type_header(&self.event_type_header))
    }

    /// Validate webhook configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.tolerance_secs == 0 {
            return Err(ValidationError::InvalidTolerance);
        }
        if self.signature_header.trim().is_empty() {
            return Err(ValidationError::MissingRequired(
                "PAYMENT_FANOUT__WEBHOOK__SIGNATURE_HEADER",
            ));
        }
        if self.provider_signature_header.trim().is_empty() {
            return Err(ValidationError::MissingRequired(
                "PAYMENT_FANOUT__WEBHOOK__PROVIDER_SIGNATURE_HEADER",
            ));
        }
        self.verification_mode()?;
        Ok(())
    }
}

fn non_blank(secret: &Option<String>) -> Option<&str> {
    secret.as_deref().filter(|s| !s.trim().is_empty())
}

impl fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("mode", &self.mode)
            .field("signing_secret", &self.signing_secret.as_ref().map(|_| "[REDACTED]"))
            .field(
                "provider_endpoint_secret",
                &self.provider_endpoint_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("tolerance_secs", &self.tolerance_secs)
            .field("signature_header", &self.signature_header)
            .field("provider_signature_header", &self.provider_signature_header)
            .field("event_type_header", &self.event_type_header)
            .finish()
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            mode: None,
            signing_secret: None,
            provider_endpoint_secret: None,
            tolerance_secs: default_tolerance_secs(),
            signature_header: default_signature_header(),
            provider_signature_header: default_provider_signature_header(),
            event_type_header: default_event_type_header(),
        }
    }
}

fn default_tolerance_secs() -> u64 {
    DEFAULT_TOLERANCE_SECS
}

fn default_signature_header() -> String {
    DEFAULT_SIGNATURE_HEADER.to_string()
}

fn default_provider_signature_header() -> String {
    DEFAULT_PROVIDER_SIGNATURE_HEADER.to_string()
}

fn default_event_type_header() -> String {
    DEFAULT_EVENT_TYPE_HEADER.to_string()
}
