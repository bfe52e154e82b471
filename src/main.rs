// Main entry point for shield-mcp
// Parses configuration, decides the operating mode once, then serves MCP on
// stdio. Logging goes to stderr; stdout belongs to the protocol.

use std::process::ExitCode;
use std::sync::Arc;

use shield_mcp::config::{cli, Config};
use shield_mcp::engine::connect;
use shield_mcp::mcp::{run_stdio, McpServer};
use shield_mcp::tools::ToolDispatcher;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool) {
    let default = if verbose { "shield_mcp=debug" } else { "shield_mcp=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    let matches = cli().get_matches();
    let config = match Config::from_matches(&matches) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("shield-mcp: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(config.verbose);

    // Wallet and transport are set up before the first request is read.
    let invoker = match connect(&config) {
        Ok(invoker) => invoker,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            eprintln!("shield-mcp: {}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        api = %invoker.base_url(),
        mode = %invoker.mode(),
        "Shield MCP server listening on stdio"
    );

    let server = Arc::new(McpServer::new(ToolDispatcher::new(invoker)));
    if let Err(e) = run_stdio(server).await {
        tracing::error!(error = %e, "stdio transport failed");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
