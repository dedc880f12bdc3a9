//! Daemon entry point for the Internet Archive MCP server.
//!
//! Loads configuration from arguments and the environment, builds the `ia`
//! runner, and serves the MCP protocol over stdio and/or streamable HTTP.

mod config;

use ia_core::control::ArchiveControlPlane;
use ia_core::runner::ArchiveCli;
use ia_mcp::server::{ServeResult, serve};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::IaConfig;

#[tokio::main]
async fn main() -> ServeResult {
    // stdout carries the stdio transport, so logs go to stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = IaConfig::from_args()?;
    let transports = config.transports();
    info!(
        stdio = transports.stdio,
        http = ?transports.http,
        ia_path = ?config.ia_path,
        "ia-mcpd starting"
    );

    let cli = ArchiveCli::new(config.resolver_config(), config.limits);
    serve(ArchiveControlPlane::new(cli, config.timeouts), transports).await
}
