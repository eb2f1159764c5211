//! Command definitions and handlers for the `llmhub` binary.

#![deny(unsafe_code)]

pub mod handlers;
pub mod parser;

pub use parser::{Cli, Commands};

// Silence unused dev-dependency warnings
#[cfg(test)]
use tokio_test as _;
