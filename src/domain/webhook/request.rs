//! Inbound webhook request as seen by the verifier.

use std::collections::BTreeMap;

use crate::domain::foundation::Timestamp;

/// Header mapping with case-insensitive lookup.
///
/// Keys are stored lowercased. When a header repeats, the first value wins,
/// matching how providers send a single signature header per delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookHeaders(BTreeMap<String, String>);

impl WebhookHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header unless one with the same (case-folded) name exists.
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.0
            .entry(name.as_ref().to_ascii_lowercase())
            .or_insert_with(|| value.into());
    }

    /// Looks up a header value regardless of the case it arrived in.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Looks up a header and treats blank values as absent.
    pub fn get_non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for WebhookHeaders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = WebhookHeaders::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// An inbound webhook delivery.
///
/// Immutable once received; the body is kept byte-for-byte as it arrived
/// because signatures are computed over the raw bytes.
#[derive(Debug, Clone)]
pub struct InboundWebhookRequest {
    body: Vec<u8>,
    headers: WebhookHeaders,
    received_at: Timestamp,
}

impl InboundWebhookRequest {
    pub fn new(body: impl Into<Vec<u8>>, headers: WebhookHeaders, received_at: Timestamp) -> Self {
        Self {
            body: body.into(),
            headers,
            received_at,
        }
    }

    /// Convenience constructor stamping the arrival time as now.
    pub fn received_now(body: impl Into<Vec<u8>>, headers: WebhookHeaders) -> Self {
        Self::new(body, headers, Timestamp::now())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn headers(&self) -> &WebhookHeaders {
        &self.headers
    }

    pub fn received_at(&self) -> Timestamp {
        self.received_at
    }
}
