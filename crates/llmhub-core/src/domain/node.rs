//! Compute node types.
//!
//! A node is one inference backend reachable over HTTP. Its health and the
//! models it can serve are coupled into a single [`NodeHealth`] variant so
//! that "a node has models only while it is online" holds by construction:
//! there is no way to represent an offline node with a stale model list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Flavour of inference backend behind an endpoint.
///
/// The kind decides which capability-listing path is probed and how the
/// model list in the response is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Ollama server (`/api/tags`).
    #[default]
    Ollama,
    /// OpenWebUI instance (`/api/v1/models`).
    OpenWebUi,
    /// Anything else speaking the Ollama wire protocol.
    Custom,
}

impl NodeKind {
    /// Path of the capability-listing endpoint used for liveness probes.
    #[must_use]
    pub const fn capability_path(self) -> &'static str {
        match self {
            Self::Ollama | Self::Custom => "/api/tags",
            Self::OpenWebUi => "/api/v1/models",
        }
    }

    /// Extract the model names from a capability-listing response body.
    ///
    /// Ollama shape:    `{"models":[{"name":"..."}]}`
    /// OpenWebUI shape: `{"data":[{"id":"..."}]}` (falls back to `name`)
    ///
    /// Anything unparseable yields an empty list rather than an error; a
    /// node that answers with garbage serves nothing.
    #[must_use]
    pub fn parse_model_list(self, body: &serde_json::Value) -> Vec<String> {
        let entries = match self {
            Self::Ollama | Self::Custom => body.get("models"),
            Self::OpenWebUi => body.get("data"),
        };

        let Some(entries) = entries.and_then(|v| v.as_array()) else {
            return Vec::new();
        };

        entries
            .iter()
            .filter_map(|entry| match self {
                Self::Ollama | Self::Custom => entry.get("name"),
                Self::OpenWebUi => entry.get("id").or_else(|| entry.get("name")),
            })
            .filter_map(|v| v.as_str())
            .map(ToString::to_string)
            .collect()
    }
}

/// Where a node sits relative to the machine running the proxy.
///
/// Purely informational; selection never looks at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeLocation {
    Local,
    Tunnel,
    #[default]
    Remote,
}

/// Health of a node as of its last probe.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum NodeHealth {
    /// Unreachable, or never probed. Serves nothing.
    #[default]
    Offline,
    /// Reachable; `models` is exactly the list the last probe returned.
    Online { models: Vec<String> },
}

impl NodeHealth {
    #[must_use]
    pub const fn is_online(&self) -> bool {
        matches!(self, Self::Online { .. })
    }

    /// Models currently served; empty when offline.
    #[must_use]
    pub fn models(&self) -> &[String] {
        match self {
            Self::Offline => &[],
            Self::Online { models } => models,
        }
    }
}

/// One inference backend known to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Stable identity, unique within the registry.
    pub id: Uuid,
    /// Human label.
    pub name: String,
    /// Base URL, no trailing slash.
    pub endpoint: String,
    pub kind: NodeKind,
    pub location: NodeLocation,
    pub health: NodeHealth,
    /// When the node was last probed, successfully or not.
    pub last_probed: Option<DateTime<Utc>>,
}

impl Node {
    /// Create a node from a descriptor with a fresh id, offline until probed.
    #[must_use]
    pub fn from_descriptor(descriptor: NodeDescriptor) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: descriptor.name,
            endpoint: normalize_endpoint(&descriptor.endpoint),
            kind: descriptor.kind,
            location: descriptor.location,
            health: NodeHealth::Offline,
            last_probed: None,
        }
    }

    #[must_use]
    pub const fn is_online(&self) -> bool {
        self.health.is_online()
    }
}

/// The caller-supplied part of a node: everything except identity and state.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeDescriptor {
    pub name: String,
    pub endpoint: String,
    #[serde(default)]
    pub kind: NodeKind,
    #[serde(default)]
    pub location: NodeLocation,
}

/// Trim trailing slashes so endpoint equality is not spelling-sensitive.
#[must_use]
pub fn normalize_endpoint(endpoint: &str) -> String {
    endpoint.trim().trim_end_matches('/').to_string()
}
