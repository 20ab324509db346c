use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use jgrants_core::config::load_dotenv;
use jgrants_core::Config;
use jgrants_mcp::{McpServer, StdioTransport};
use jgrants_search::{register_subsidy_tools, JGrantsClient};
use jgrants_tool_runtime::ToolRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = Config::from_env();
    let client = JGrantsClient::from_config(&config.search)?;
    info!(base_url = %client.base_url(), "J-Grants client ready");

    let mut registry = ToolRegistry::new();
    register_subsidy_tools(&mut registry, Arc::new(client))?;

    let server = McpServer::new(Arc::new(registry));
    let mut transport = StdioTransport::new();
    server.run(&mut transport).await?;

    Ok(())
}
