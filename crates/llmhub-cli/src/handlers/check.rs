//! One-shot connection check against a single node endpoint.

use std::time::Duration;

use llmhub_core::{NodeDescriptor, NodeKind, NodeLocation};
use llmhub_proxy::{HealthProber, NodeRegistry};

pub async fn execute(endpoint: &str, kind: &str) -> anyhow::Result<()> {
    let kind = parse_kind(kind)?;

    let registry = NodeRegistry::new();
    let node = registry
        .add(NodeDescriptor {
            name: "check".to_string(),
            endpoint: endpoint.to_string(),
            kind,
            location: NodeLocation::Remote,
        })
        .await;

    let prober = HealthProber::new(Duration::from_secs(5))?;
    let Some(node) = prober.probe(&registry, node.id).await else {
        anyhow::bail!("node vanished during probe");
    };

    if node.is_online() {
        println!("{} is online", node.endpoint);
        if node.health.models().is_empty() {
            println!("  (no models installed)");
        }
        for model in node.health.models() {
            println!("  {model}");
        }
    } else {
        println!("{} is offline", node.endpoint);
    }

    Ok(())
}

fn parse_kind(raw: &str) -> anyhow::Result<NodeKind> {
    match raw {
        "ollama" => Ok(NodeKind::Ollama),
        "openwebui" => Ok(NodeKind::OpenWebUi),
        "custom" => Ok(NodeKind::Custom),
        other => anyhow::bail!("unknown node kind: {other} (expected ollama, openwebui or custom)"),
    }
}
