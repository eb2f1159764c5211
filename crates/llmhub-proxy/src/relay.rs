//! Streaming relay: forward one request to a node and stream the answer
//! back verbatim.
//!
//! The relay never buffers the upstream body. Chunks are handed to the
//! downstream the moment they arrive, which preserves time-to-first-token
//! for generation endpoints. Dropping the returned response (downstream
//! gone) aborts the upstream request with it.

use axum::body::Body;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::TryStreamExt;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

use llmhub_core::{Node, RoutingRequest};

/// Why a relay could not be opened.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The node could not be reached or the request could not be sent.
    #[error("failed to reach compute node: {0}")]
    Upstream(String),

    /// The node answered with a non-success status before streaming began.
    #[error("compute node returned status {status}")]
    UpstreamStatus { status: u16, body: String },
}

/// Open the upstream side of a relay session.
///
/// Posts the routing request to the node's chat/generate path and hands
/// back the still-streaming response. The caller owns the stream from
/// here: forward its chunks, and drop it to cancel.
///
/// # Errors
///
/// [`RelayError::Upstream`] when the node is unreachable,
/// [`RelayError::UpstreamStatus`] when it answers with a failure status
/// (the body is captured so the caller can proxy it through).
pub async fn open_relay(
    client: &Client,
    node: &Node,
    request: &RoutingRequest,
) -> Result<reqwest::Response, RelayError> {
    let url = format!("{}{}", node.endpoint, request.payload.upstream_path());
    debug!(%url, model = %request.model, "Relaying request to compute node");

    let response = client
        .post(&url)
        .json(&request.upstream_body())
        .send()
        .await
        .map_err(|e| RelayError::Upstream(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(%url, status = %status, "Compute node rejected relayed request");
        return Err(RelayError::UpstreamStatus {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response)
}

/// Wrap an open upstream response into a chunked downstream response.
///
/// Chunks pass through undecoded and in order. The upstream content type
/// is preserved so Ollama NDJSON and OpenAI SSE both survive the trip.
pub fn streaming_response(upstream: reqwest::Response) -> Response {
    let content_type = upstream
        .headers()
        .get("content-type")
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));

    let stream = upstream.bytes_stream().map_err(std::io::Error::other);

    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", content_type)
        .header("cache-control", "no-cache")
        .header("x-accel-buffering", "no")
        .body(Body::from_stream(stream))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
