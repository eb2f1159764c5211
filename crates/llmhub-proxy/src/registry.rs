//! Node registry: the authoritative in-memory list of compute nodes.
//!
//! Nodes are kept in insertion order because that order is the tie-break
//! for default selection. All mutations replace whole fields on a single
//! node record; the `RwLock` guards the read-modify-write so probes and
//! transport handlers can run on parallel tasks.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use llmhub_core::domain::node::normalize_endpoint;
use llmhub_core::{Node, NodeDescriptor, NodeHealth};

/// Cloneable handle to the shared node list.
#[derive(Clone, Default)]
pub struct NodeRegistry {
    nodes: Arc<RwLock<Vec<Node>>>,
}

impl NodeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated with seed nodes, all offline until
    /// their first probe.
    #[must_use]
    pub async fn from_seeds(seeds: Vec<NodeDescriptor>) -> Self {
        let registry = Self::new();
        for seed in seeds {
            registry.add(seed).await;
        }
        registry
    }

    /// Snapshot of every node in insertion order.
    pub async fn list(&self) -> Vec<Node> {
        self.nodes.read().await.clone()
    }

    /// Register a new node with a fresh id. It starts offline with no
    /// models; the caller decides whether to probe it right away.
    pub async fn add(&self, descriptor: NodeDescriptor) -> Node {
        let node = Node::from_descriptor(descriptor);
        info!(node_id = %node.id, endpoint = %node.endpoint, "Registering compute node");
        self.nodes.write().await.push(node.clone());
        node
    }

    /// Remove a node. Returns `false` when the id is unknown (no-op).
    pub async fn remove(&self, id: Uuid) -> bool {
        let mut nodes = self.nodes.write().await;
        let before = nodes.len();
        nodes.retain(|n| n.id != id);
        let removed = nodes.len() != before;
        if removed {
            info!(node_id = %id, "Removed compute node");
        }
        removed
    }

    pub async fn find_by_id(&self, id: Uuid) -> Option<Node> {
        self.nodes.read().await.iter().find(|n| n.id == id).cloned()
    }

    /// Look up a node by endpoint URL; trailing slashes are ignored.
    pub async fn find_by_endpoint(&self, endpoint: &str) -> Option<Node> {
        let wanted = normalize_endpoint(endpoint);
        self.nodes
            .read()
            .await
            .iter()
            .find(|n| n.endpoint == wanted)
            .cloned()
    }

    /// Record a probe outcome on one node, leaving every other node
    /// untouched. Returns the updated snapshot, or `None` when the node
    /// was removed while the probe was in flight.
    pub async fn apply_probe(
        &self,
        id: Uuid,
        health: NodeHealth,
        probed_at: DateTime<Utc>,
    ) -> Option<Node> {
        let mut nodes = self.nodes.write().await;
        let node = nodes.iter_mut().find(|n| n.id == id)?;
        node.health = health;
        node.last_probed = Some(probed_at);
        Some(node.clone())
    }

    /// Number of nodes currently online.
    pub async fn online_count(&self) -> usize {
        self.nodes.read().await.iter().filter(|n| n.is_online()).count()
    }
}
