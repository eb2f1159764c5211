//! Wire-level data models for the HTTP surface.
//!
//! Domain types live in `llmhub-core`; this module maps them onto the
//! JSON shapes callers expect, health flattened into the `isOnline` +
//! `models` pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use llmhub_core::{ChatMessage, Node, NodeKind, NodeLocation, RoutingPayload, RoutingRequest};

/// One node as reported to callers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeView {
    pub id: Uuid,
    pub name: String,
    pub endpoint: String,
    pub kind: NodeKind,
    pub location: NodeLocation,
    pub is_online: bool,
    pub models: Vec<String>,
    pub last_probed: Option<DateTime<Utc>>,
}

impl From<Node> for NodeView {
    fn from(node: Node) -> Self {
        Self {
            id: node.id,
            name: node.name,
            endpoint: node.endpoint,
            kind: node.kind,
            location: node.location,
            is_online: node.health.is_online(),
            models: node.health.models().to_vec(),
            last_probed: node.last_probed,
        }
    }
}

/// `GET /health` response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub nodes: Vec<NodeView>,
}

/// `GET /api/nodes` response.
#[derive(Debug, Serialize)]
pub struct NodesResponse {
    pub nodes: Vec<NodeView>,
}

/// `GET /api/models` response.
#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<String>,
}

/// `GET /api/check?endpoint=...` response for one node.
#[derive(Debug, Serialize)]
pub struct CheckNodeResponse {
    pub connected: bool,
    pub endpoint: String,
    pub models: Vec<String>,
}

/// `GET /api/check` aggregate response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckSummaryResponse {
    pub connected: bool,
    pub online_nodes: usize,
    pub total_nodes: usize,
    pub nodes: Vec<NodeView>,
}

/// Optional `?endpoint=` filter shared by `/api/models` and `/api/check`.
#[derive(Debug, Deserialize)]
pub struct EndpointQuery {
    pub endpoint: Option<String>,
}

fn default_true() -> bool {
    true
}

pub(crate) fn default_options() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// Body of `POST /api/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatProxyRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(default = "default_true")]
    pub stream: bool,
    #[serde(default = "default_options")]
    pub options: serde_json::Value,
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl From<ChatProxyRequest> for RoutingRequest {
    fn from(request: ChatProxyRequest) -> Self {
        Self {
            model: request.model,
            payload: RoutingPayload::Chat(request.messages),
            stream: request.stream,
            options: request.options,
            endpoint_hint: request.endpoint,
        }
    }
}

/// Body of `POST /api/generate`.
#[derive(Debug, Deserialize)]
pub struct GenerateProxyRequest {
    pub model: String,
    pub prompt: String,
    #[serde(default = "default_true")]
    pub stream: bool,
    #[serde(default = "default_options")]
    pub options: serde_json::Value,
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl From<GenerateProxyRequest> for RoutingRequest {
    fn from(request: GenerateProxyRequest) -> Self {
        Self {
            model: request.model,
            payload: RoutingPayload::Generate(request.prompt),
            stream: request.stream,
            options: request.options,
            endpoint_hint: request.endpoint,
        }
    }
}
