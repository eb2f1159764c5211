//! Proxy configuration.
//!
//! Assembled by the binary from CLI flags and environment variables;
//! everything here parameterizes the registry's initial contents and the
//! HTTP surface.

use std::time::Duration;

use llmhub_core::{NodeDescriptor, NodeKind, NodeLocation};

/// CORS configuration for the HTTP surface.
#[derive(Debug, Clone, Default)]
pub enum CorsConfig {
    /// Allow all origins (development mode).
    #[default]
    AllowAll,
    /// Allow specific origins (production mode).
    AllowOrigins(Vec<String>),
}

/// Runtime configuration for the proxy server.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Port for the HTTP server.
    pub port: u16,
    /// Seed node endpoints registered at startup.
    pub seed_endpoints: Vec<String>,
    /// CORS configuration.
    pub cors: CorsConfig,
    /// Hard per-probe timeout.
    pub probe_timeout: Duration,
    /// Period of the background probe loop.
    pub probe_interval: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            seed_endpoints: vec!["http://localhost:11434".to_string()],
            cors: CorsConfig::default(),
            probe_timeout: Duration::from_secs(5),
            probe_interval: Duration::from_secs(30),
        }
    }
}

impl HubConfig {
    /// Descriptors for the seed nodes: `node-0`, `node-1`, ... in the
    /// order the endpoints were configured. Local addresses are tagged as
    /// such; everything else defaults to remote.
    #[must_use]
    pub fn seed_descriptors(&self) -> Vec<NodeDescriptor> {
        self.seed_endpoints
            .iter()
            .enumerate()
            .map(|(index, endpoint)| NodeDescriptor {
                name: format!("node-{index}"),
                endpoint: endpoint.clone(),
                kind: NodeKind::Ollama,
                location: guess_location(endpoint),
            })
            .collect()
    }
}

/// Parse a comma-separated endpoint list, skipping empty entries.
#[must_use]
pub fn parse_endpoint_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn guess_location(endpoint: &str) -> NodeLocation {
    if endpoint.contains("localhost") || endpoint.contains("127.0.0.1") {
        NodeLocation::Local
    } else {
        NodeLocation::Remote
    }
}
