//! Core error taxonomy.

use thiserror::Error;

/// Why a routing request could not be resolved to a node.
///
/// "You asked for a specific dead node" is deliberately distinct from
/// "nothing is up" so callers can tell the two apart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// The explicit endpoint hint matches no registered node.
    #[error("compute node not found: {0}")]
    NodeNotFound(String),

    /// The explicit endpoint hint matches a node that is offline.
    #[error("specified compute node is offline: {0}")]
    NodeOffline(String),

    /// No hint was given and no registered node is online.
    #[error("no online compute nodes available")]
    NoNodesAvailable,
}

impl SelectionError {
    /// Suggested HTTP status code for this error.
    #[must_use]
    pub const fn suggested_status_code(&self) -> u16 {
        match self {
            Self::NodeNotFound(_) => 404,
            Self::NodeOffline(_) | Self::NoNodesAvailable => 503,
        }
    }
}
