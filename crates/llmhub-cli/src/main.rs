//! CLI entry point - the composition root.
//!
//! This is the only place where configuration is assembled and the proxy
//! is wired together; command dispatch routes to handlers.

use std::time::Duration;

use clap::Parser;

use llmhub_cli::{Cli, Commands, handlers};
use llmhub_proxy::config::parse_endpoint_list;
use llmhub_proxy::{CorsConfig, HubConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        // No command provided - show help
        use clap::CommandFactory;
        llmhub_cli::Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Serve {
            port,
            endpoints,
            allowed_origins,
            probe_interval,
            probe_timeout,
        } => {
            let cors = match allowed_origins {
                Some(raw) => {
                    let origins = parse_endpoint_list(&raw);
                    if origins.is_empty() {
                        CorsConfig::AllowAll
                    } else {
                        CorsConfig::AllowOrigins(origins)
                    }
                }
                None => CorsConfig::AllowAll,
            };

            let config = HubConfig {
                port,
                seed_endpoints: parse_endpoint_list(&endpoints),
                cors,
                probe_timeout: Duration::from_secs(probe_timeout),
                probe_interval: Duration::from_secs(probe_interval),
            };

            llmhub_proxy::serve(config).await?;
        }
        Commands::Check { endpoint, kind } => {
            handlers::check::execute(&endpoint, &kind).await?;
        }
    }

    Ok(())
}
