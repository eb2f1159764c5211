//! Node selection over a registry snapshot.
//!
//! Deliberately simple: an explicit hint wins or fails loudly, otherwise
//! the first online node in registry order is taken. No randomization, no
//! load metrics. A smarter policy (least-loaded, round-robin) would slot in
//! here without touching the transports.

use crate::domain::node::{Node, normalize_endpoint};
use crate::error::SelectionError;

/// Resolve a routing request to one concrete node.
///
/// `nodes` is a registry snapshot in insertion order, which is the
/// tie-break for default selection.
///
/// # Errors
///
/// - hint names an unknown endpoint → [`SelectionError::NodeNotFound`]
/// - hint names an offline node → [`SelectionError::NodeOffline`];
///   never silently falls back to another node
/// - no hint, nothing online → [`SelectionError::NoNodesAvailable`]
pub fn select_node<'a>(
    nodes: &'a [Node],
    endpoint_hint: Option<&str>,
) -> Result<&'a Node, SelectionError> {
    if let Some(hint) = endpoint_hint {
        let wanted = normalize_endpoint(hint);
        let node = nodes
            .iter()
            .find(|n| n.endpoint == wanted)
            .ok_or_else(|| SelectionError::NodeNotFound(wanted.clone()))?;
        if !node.is_online() {
            return Err(SelectionError::NodeOffline(wanted));
        }
        return Ok(node);
    }

    nodes
        .iter()
        .find(|n| n.is_online())
        .ok_or(SelectionError::NoNodesAvailable)
}
