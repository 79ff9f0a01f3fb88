//! HTTP adapter for webhook ingestion.
//!
//! - `POST /webhook` - 200 on publish, 401 on any verification failure,
//!   5xx when the event channel refuses the event

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{ErrorResponse, StatusResponse};
pub use handlers::{receive_webhook, webhook_headers, WebhookAppState, WebhookResponse};
pub use routes::webhook_router;
