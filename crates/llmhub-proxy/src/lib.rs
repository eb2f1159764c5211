//! Compute-node routing and streaming proxy.
//!
//! The pieces, leaf-first: [`registry::NodeRegistry`] holds the known
//! inference nodes, [`probe::HealthProber`] keeps their health fresh,
//! [`llmhub_core::selection`] picks a target, [`relay`] forwards one
//! request and streams the answer back, and [`server`] / [`ws`] are the
//! two transports in front of it all.

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod models;
pub mod probe;
pub mod registry;
pub mod relay;
pub mod server;
pub mod ws;

#[cfg(test)]
mod test_support;

pub use config::{CorsConfig, HubConfig};
pub use error::HttpError;
pub use probe::HealthProber;
pub use registry::NodeRegistry;
pub use server::{AppState, router, serve};

// Silence unused dev-dependency warnings for handler tests
#[cfg(test)]
use http_body_util as _;
#[cfg(test)]
use tokio_test as _;
#[cfg(test)]
use tower as _;
