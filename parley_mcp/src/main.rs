use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use parley_core::{
    mcp_server::{JsonRpcHandler, McpServer},
    transport::StdioTransport,
    SlackClient, SlackConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout carries protocol frames, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match SlackConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };

    let slack = SlackClient::new(&config)?;
    let server = McpServer::new(config, Arc::new(slack));
    let handler = JsonRpcHandler::new(server);
    let transport = StdioTransport::new(handler);

    info!("Slack MCP server running on stdio");

    tokio::select! {
        res = transport.run() => {
            if let Err(e) = res {
                error!("Transport error: {}", e);
                return Err(e.into());
            }
            info!("stdin closed, shutting down");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt received, shutting down");
        }
    }

    Ok(())
}
