//! Request-level errors.
//!
//! Only failures the caller can see live here. Problems inside the payload
//! are repaired by the normalizer and never surface as errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::http::response::json_error;

#[derive(Debug, Error)]
pub enum ShimError {
    /// The inbound body is not valid JSON.
    #[error("Invalid JSON body: {0}")]
    MalformedBody(#[source] serde_json::Error),

    /// The inbound body could not be read.
    #[error("Failed to read request body: {0}")]
    Body(#[source] axum::Error),

    /// The upstream request failed before a response arrived.
    #[error("{0}")]
    Upstream(#[from] reqwest::Error),

    /// The outbound request could not be built.
    #[error("Invalid upstream request: {0}")]
    Request(String),
}

impl ShimError {
    pub fn status(&self) -> StatusCode {
        match self {
            ShimError::MalformedBody(_) | ShimError::Body(_) => StatusCode::BAD_REQUEST,
            ShimError::Upstream(_) | ShimError::Request(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ShimError::MalformedBody(_) | ShimError::Body(_) => "invalid_request_error",
            ShimError::Upstream(_) | ShimError::Request(_) => "upstream_error",
        }
    }
}

impl IntoResponse for ShimError {
    fn into_response(self) -> Response {
        // The parse position is not useful to callers; keep the body generic.
        let message = match &self {
            ShimError::MalformedBody(_) => "Invalid JSON body".to_string(),
            other => other.to_string(),
        };
        json_error(self.status(), self.kind(), &message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_body_is_400() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let shim = ShimError::MalformedBody(err);
        assert_eq!(shim.status(), StatusCode::BAD_REQUEST);
        assert_eq!(shim.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn request_build_failure_is_500() {
        let shim = ShimError::Request("bad uri".into());
        assert_eq!(shim.to_string(), "Invalid upstream request: bad uri");
        assert_eq!(shim.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
