use anyhow::Result;
use tracing::{info, warn};

use super::open_project;
use symdex::indexer::watcher::start_watcher;
use symdex::mcp::McpServer;

/// Start the MCP server with stdio transport. Stdout carries protocol
/// messages only.
pub async fn serve_stdio(project: String, watch: bool) -> Result<()> {
    let indexer = open_project(&project)?;
    info!("MCP server (stdio) for project: {}", indexer.root().display());

    if indexer.summary().total_symbols == 0 {
        warn!("No symbols indexed yet; building in the background");
    }
    // Bring the index up to date without delaying the handshake
    drop(indexer.spawn_build(false));

    if watch || indexer.config().indexing.watch {
        let watched = indexer.clone();
        tokio::spawn(async move {
            if let Err(e) = start_watcher(watched).await {
                warn!("File watcher stopped: {}", e);
            }
        });
    }

    McpServer::new(indexer).run().await
}
