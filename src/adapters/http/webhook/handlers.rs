//! HTTP handlers for webhook ingestion.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::application::{IngestOutcome, IngestWebhookCommand, WebhookIngestHandler};
use crate::domain::webhook::{InboundWebhookRequest, WebhookHeaders};

use super::dto::{ErrorResponse, StatusResponse};

/// Header set by the request-id layer; becomes the envelope correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct WebhookAppState {
    pub ingest: Arc<WebhookIngestHandler>,
}

impl WebhookAppState {
    pub fn new(ingest: Arc<WebhookIngestHandler>) -> Self {
        Self { ingest }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /webhook - Verify and publish a payment provider webhook.
///
/// The body is taken as raw bytes; it is what the provider signed.
pub async fn receive_webhook(
    State(state): State<WebhookAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> WebhookResponse {
    let request = InboundWebhookRequest::received_now(body.to_vec(), webhook_headers(&headers));

    let mut cmd = IngestWebhookCommand::new(request);
    if let Some(request_id) = headers.get(REQUEST_ID_HEADER).and_then(|v| v.to_str().ok()) {
        cmd = cmd.with_correlation_id(request_id);
    }

    WebhookResponse(state.ingest.handle(cmd).await)
}

/// Copies the HTTP headers into the domain's case-insensitive map.
///
/// Values that are not visible ASCII are dropped.
pub fn webhook_headers(headers: &HeaderMap) -> WebhookHeaders {
    headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v)))
        .collect()
}

// ════════════════════════════════════════════════════════════════════════════════
// Response Mapping
// ════════════════════════════════════════════════════════════════════════════════

/// Converts an ingest outcome to an HTTP response.
pub struct WebhookResponse(pub IngestOutcome);

impl IntoResponse for WebhookResponse {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        match self.0 {
            IngestOutcome::Published { .. } => (StatusCode::OK, Json(StatusResponse::ok())).into_response(),
            IngestOutcome::Rejected(_) => (status, Json(ErrorResponse::unauthorized())).into_response(),
            IngestOutcome::PublishFailed(_) => (status, Json(ErrorResponse::internal())).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::EventId;
    use crate::domain::webhook::VerificationError;
    use crate::ports::PublishError;
    use axum::http::HeaderValue;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Signature", HeaderValue::from_static("abc"));

        let converted = webhook_headers(&headers);

        assert_eq!(converted.get("x-signature"), Some("abc"));
        assert_eq!(converted.get("X-SIGNATURE"), Some("abc"));
    }

    #[test]
    fn non_ascii_header_values_are_dropped() {
        let mut headers = HeaderMap::new();
        headers.insert("x-signature", HeaderValue::from_bytes(&[0xff, 0xfe]).unwrap());

        assert!(webhook_headers(&headers).get("x-signature").is_none());
    }

    #[test]
    fn every_rejection_reason_has_the_same_response() {
        let reasons = [
            VerificationError::MissingHeader("X-Signature".into()),
            VerificationError::SignatureMismatch,
            VerificationError::TimestampOutOfTolerance,
            VerificationError::MalformedHeader("missing timestamp"),
        ];

        for reason in reasons {
            let response = WebhookResponse(IngestOutcome::Rejected(reason)).into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn published_is_ok() {
        let response = WebhookResponse(IngestOutcome::Published {
            event_id: EventId::new(),
            event_type: "invoice.paid".into(),
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn publish_failure_is_server_error() {
        let response = WebhookResponse(IngestOutcome::PublishFailed(PublishError::QuotaExceeded(
            "full".into(),
        )))
        .into_response();

        assert!(response.status().is_server_error());
    }
}
