//! Health probing: bounded-time liveness and capability checks.
//!
//! A probe never fails its caller. Whatever happens on the wire ends up
//! as the node's new [`NodeHealth`], and `probe_all` settles every node
//! concurrently so one dead endpoint cannot stall the rest.

use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use llmhub_core::{Node, NodeHealth, NodeKind};

use crate::registry::NodeRegistry;

/// Default hard timeout for a single probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Probes node capability endpoints and records the outcome.
#[derive(Clone)]
pub struct HealthProber {
    client: Client,
}

impl HealthProber {
    /// Build a prober whose every request carries the given hard timeout.
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
        })
    }

    /// Probe one node and record the outcome in the registry.
    ///
    /// Success replaces the node's model list with exactly what the node
    /// reported; any failure (timeout, connect error, non-success status,
    /// unparseable body) marks it offline and clears the list. Either way
    /// `last_probed` is stamped. Returns the updated snapshot, or `None`
    /// when the node disappeared from the registry mid-probe.
    pub async fn probe(&self, registry: &NodeRegistry, id: Uuid) -> Option<Node> {
        let node = registry.find_by_id(id).await?;
        let health = self.check_endpoint(&node.endpoint, node.kind).await;

        match &health {
            NodeHealth::Online { models } => {
                debug!(endpoint = %node.endpoint, models = models.len(), "Node is online");
            }
            NodeHealth::Offline => {
                debug!(endpoint = %node.endpoint, "Node is offline");
            }
        }

        registry.apply_probe(id, health, Utc::now()).await
    }

    /// Probe every registered node concurrently and wait for all to settle.
    pub async fn probe_all(&self, registry: &NodeRegistry) {
        let nodes = registry.list().await;
        let probes = nodes.iter().map(|node| self.probe(registry, node.id));
        futures_util::future::join_all(probes).await;
    }

    /// Start the background refresh loop: one pass immediately, then one
    /// per `period`, until the token is cancelled.
    pub fn spawn_refresh_loop(
        &self,
        registry: NodeRegistry,
        period: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let prober = self.clone();
        tokio::spawn(async move {
            info!(period_secs = period.as_secs(), "Probe loop started");
            let mut timer = tokio::time::interval(period);
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = timer.tick() => prober.probe_all(&registry).await,
                }
            }
            info!("Probe loop stopped");
        })
    }

    async fn check_endpoint(&self, endpoint: &str, kind: NodeKind) -> NodeHealth {
        let url = format!("{endpoint}{}", kind.capability_path());

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(%url, error = %e, "Probe request failed");
                return NodeHealth::Offline;
            }
        };

        if !response.status().is_success() {
            debug!(%url, status = %response.status(), "Probe returned non-success status");
            return NodeHealth::Offline;
        }

        match response.json::<serde_json::Value>().await {
            Ok(body) => NodeHealth::Online {
                models: kind.parse_model_list(&body),
            },
            Err(e) => {
                debug!(%url, error = %e, "Probe response was not JSON");
                NodeHealth::Offline
            }
        }
    }
}
