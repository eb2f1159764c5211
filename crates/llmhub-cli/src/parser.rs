//! CLI argument parsing.

use clap::{Parser, Subcommand};

/// Routing proxy for interchangeable LLM inference backends.
#[derive(Parser)]
#[command(name = "llmhub", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the routing proxy server
    Serve {
        /// Port to listen on
        #[arg(long, env = "LLMHUB_PORT", default_value_t = 3000)]
        port: u16,

        /// Comma-separated seed node endpoints
        #[arg(long, env = "LLMHUB_ENDPOINTS", default_value = "http://localhost:11434")]
        endpoints: String,

        /// Comma-separated allowed CORS origins; all origins when unset
        #[arg(long, env = "LLMHUB_ALLOWED_ORIGINS")]
        allowed_origins: Option<String>,

        /// Seconds between background probe passes
        #[arg(long, default_value_t = 30)]
        probe_interval: u64,

        /// Per-probe timeout in seconds
        #[arg(long, default_value_t = 5)]
        probe_timeout: u64,
    },

    /// Probe one endpoint and print its models
    Check {
        /// Node endpoint URL
        endpoint: String,

        /// Backend kind: ollama, openwebui or custom
        #[arg(long, default_value = "ollama")]
        kind: String,
    },
}
