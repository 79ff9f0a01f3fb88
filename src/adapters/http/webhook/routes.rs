//! Axum router configuration for the webhook endpoint.

use axum::{routing::post, Router};

use super::handlers::{receive_webhook, WebhookAppState};

/// Create the webhook router.
///
/// # Routes
/// - `POST /webhook` - Verify and publish a webhook (no auth, signature verified)
pub fn webhook_router() -> Router<WebhookAppState> {
    Router::new().route("/webhook", post(receive_webhook))
}
