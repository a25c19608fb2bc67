//! Shared helpers for staging per-node artifacts an adapter's launch plan references.

use std::path::Path;

use cord_core::NodeId;
use serde_json::Value;

/// Filesystem-safe slug for a node id, `#12` -> `12`.
pub fn node_file_slug(id: NodeId) -> String {
    id.to_string().trim_start_matches('#').to_string()
}

/// Write a JSON payload to disk, creating parent directories as needed.
pub fn write_json_file(path: &Path, payload: &Value) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(payload)?)
}

/// The MCP server configuration pointing an agent CLI at Cord's own tool protocol for `id`.
pub fn mcp_config(id: NodeId) -> Value {
    serde_json::json!({
        "mcpServers": {
            "cord": {
                "command": "cord",
                "args": ["tool-server", "--agent-id", id.to_string()],
            }
        }
    })
}
