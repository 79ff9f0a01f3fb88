//! HTTP DTOs for the webhook endpoint.
//!
//! Response bodies are deliberately uniform: a rejected webhook never learns
//! which check failed.

use serde::Serialize;

/// Body for successful requests.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self { status: "ok" }
    }
}

/// Body for failed requests.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub message: &'static str,
}

impl ErrorResponse {
    pub fn unauthorized() -> Self {
        Self {
            message: "unauthorized",
        }
    }

    pub fn internal() -> Self {
        Self {
            message: "internal error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bodies_serialize_to_fixed_shapes() {
        assert_eq!(
            serde_json::to_string(&StatusResponse::ok()).unwrap(),
            r#"{"status":"ok"}"#
        );
        assert_eq!(
            serde_json::to_string(&ErrorResponse::unauthorized()).unwrap(),
            r#"{"message":"unauthorized"}"#
        );
        assert_eq!(
            serde_json::to_string(&ErrorResponse::internal()).unwrap(),
            r#"{"message":"internal error"}"#
        );
    }
}
