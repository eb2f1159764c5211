//! HTTP-facing error types and their response mappings.
//!
//! Every failure crosses the boundary as a JSON body with a
//! human-readable reason; stack traces and debug formatting stay inside.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use llmhub_core::SelectionError;
use serde::Serialize;
use thiserror::Error;

use crate::relay::RelayError;

/// Errors surfaced by the HTTP transport.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Resource not found (unknown node id or endpoint).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request (invalid input).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Service unavailable (no node, or the requested node is offline).
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Upstream node could not be reached at relay time.
    #[error("Bad gateway: {0}")]
    BadGateway(String),

    /// Upstream answered with a failure status; proxied through verbatim.
    #[error("Upstream returned status {status}")]
    UpstreamStatus { status: u16, details: String },

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
    /// Upstream response body, when the upstream produced the failure
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message, details) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            Self::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg, None),
            Self::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg, None),
            Self::UpstreamStatus { status, details } => (
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                "upstream request failed".to_string(),
                Some(details),
            ),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg, None),
        };

        let body = ErrorBody {
            error: message,
            status: status.as_u16(),
            details,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<SelectionError> for HttpError {
    fn from(err: SelectionError) -> Self {
        match &err {
            SelectionError::NodeNotFound(_) => Self::NotFound(err.to_string()),
            SelectionError::NodeOffline(_) | SelectionError::NoNodesAvailable => {
                Self::ServiceUnavailable(err.to_string())
            }
        }
    }
}

impl From<RelayError> for HttpError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::Upstream(reason) => Self::BadGateway(reason),
            RelayError::UpstreamStatus { status, body } => Self::UpstreamStatus {
                status,
                details: body,
            },
        }
    }
}
