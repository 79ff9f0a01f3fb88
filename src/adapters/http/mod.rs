//! HTTP adapters - the service's public surface.
//!
//! - `POST /webhook` - webhook ingestion
//! - `GET /ws` - live event subscription
//! - `GET /health` - liveness

pub mod webhook;

use std::time::Duration;

use axum::{http::HeaderName, routing::get, Json, Router};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::adapters::websocket::{websocket_router, WebSocketState};

pub use webhook::{webhook_router, WebhookAppState};

/// GET /health
pub async fn health() -> Json<webhook::StatusResponse> {
    Json(webhook::StatusResponse::ok())
}

/// Assemble the full application router.
///
/// Every request gets an `x-request-id` (generated when absent), a trace span,
/// and a response deadline.
pub fn app_router(
    webhook_state: WebhookAppState,
    websocket_state: WebSocketState,
    request_timeout: Duration,
) -> Router {
    let request_id = HeaderName::from_static(webhook::handlers::REQUEST_ID_HEADER);

    Router::new()
        .route("/health", get(health))
        .merge(webhook_router().with_state(webhook_state))
        .merge(websocket_router().with_state(websocket_state))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id))
                .layer(TimeoutLayer::new(request_timeout)),
        )
}
