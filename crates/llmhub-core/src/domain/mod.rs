//! Domain model: compute nodes and routing requests.

pub mod node;
pub mod routing;

pub use node::{Node, NodeDescriptor, NodeHealth, NodeKind, NodeLocation};
pub use routing::{ChatMessage, RoutingPayload, RoutingRequest};
