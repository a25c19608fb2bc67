//! The engine's side of the Tool Server transport.
//!
//! The Graph Store lives only inside the engine's own process, but a Tool Server is spawned
//! as its own OS subprocess by the agent CLI itself (per the per-node `mcp-<slug>.json`
//! pointing at `cord tool-server --agent-id <id>`). A Unix domain socket bridges the two: the
//! engine listens on `<stage_dir>/tools.sock`, and `cord tool-server` (run inside the agent's
//! process tree) dials it and proxies its own stdio over the connection. The first line on
//! every accepted connection is a handshake naming the connecting agent; everything after
//! that is the ordinary framed JSON protocol `ToolServer::serve` already speaks.

use std::path::{Path, PathBuf};

use cord_core::NodeId;
use cord_store::GraphStore;
use cord_tools::ToolServer;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::task::JoinHandle;

pub fn socket_path(stage_dir: &Path) -> PathBuf {
    stage_dir.join("tools.sock")
}

/// Bind the socket and spawn the accept loop as a background task. The returned handle should
/// be aborted when the engine shuts down; the loop never exits on its own.
pub fn spawn_listener(stage_dir: &Path, store: GraphStore) -> std::io::Result<JoinHandle<()>> {
    std::fs::create_dir_all(stage_dir)?;
    let path = socket_path(stage_dir);
    if path.exists() {
        std::fs::remove_file(&path)?;
    }
    let listener = UnixListener::bind(&path)?;

    Ok(tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let store = store.clone();
                    tokio::spawn(async move {
                        if let Err(e) = serve_connection(store, stream).await {
                            tracing::warn!(error = %e, "tool connection ended with an error");
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to accept a tool connection");
                }
            }
        }
    }))
}

async fn serve_connection(store: GraphStore, stream: UnixStream) -> std::io::Result<()> {
    let (read_half, write_half) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);

    let mut handshake = String::new();
    reader.read_line(&mut handshake).await?;
    let agent_id = parse_handshake(&handshake).ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidData, "bad tool-server handshake")
    })?;

    let server = ToolServer::new(store, agent_id);
    server.serve(reader, write_half).await
}

fn parse_handshake(line: &str) -> Option<NodeId> {
    let value: serde_json::Value = serde_json::from_str(line.trim()).ok()?;
    value.get("agent_id")?.as_str()?.parse().ok()
}
