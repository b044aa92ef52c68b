use anyhow::Context as _;
use clap::Parser as _;
use resdb_mcp::{Cli, Gateway};
use rmcp::ServiceExt as _;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    resdb_mcp::logging::init(&cli.log_level, cli.log_format)?;

    let config = cli.resolve().context("resolve configuration")?;
    if !config.verify_tls {
        warn!(
            base_url = %config.base_url,
            "TLS certificate verification is DISABLED for the remote API; use only in development"
        );
    }

    let gateway = Gateway::new(&config).context("build gateway")?;

    info!(
        base_url = %config.base_url,
        verify_tls = config.verify_tls,
        "ResilientDB MCP server running on stdio"
    );
    let service = gateway
        .serve(rmcp::transport::stdio())
        .await
        .context("MCP initialize handshake")?;

    let reason = service.waiting().await.context("MCP service task")?;
    info!(?reason, "MCP server stopped");
    Ok(())
}
