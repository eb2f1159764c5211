//! Core domain types and node-selection logic for llmhub.
//!
//! This crate is adapter-free: it knows nothing about HTTP servers or
//! clients. The proxy crate owns all I/O and consumes these types.

#![deny(unsafe_code)]

pub mod domain;
pub mod error;
pub mod selection;

// Re-export commonly used types for convenience
pub use domain::{
    ChatMessage, Node, NodeDescriptor, NodeHealth, NodeKind, NodeLocation, RoutingPayload,
    RoutingRequest,
};
pub use error::SelectionError;
pub use selection::select_node;

// Silence unused dev-dependency warnings until we add mock-based tests
#[cfg(test)]
use tokio_test as _;
