//! Debugging snapshot of the store, written to `<project>/.cord/cord.db` after every mutation.
//!
//! This is not a recovery log: per the spec, a run never resumes from a previous store, so the
//! snapshot exists purely so an operator can inspect `cord.db` with `cat`/`jq` while a run is live.

use cord_core::{Node, NodeId};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Serialize, Deserialize)]
pub struct Snapshot {
    pub next_id: u64,
    pub nodes: Vec<Node>,
    /// `(node, depends_on)` pairs, as a plain list for readability in the debugging dump.
    pub deps: Vec<(NodeId, Vec<NodeId>)>,
}

pub fn write(path: &Path, snapshot: &Snapshot) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(snapshot)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    std::fs::write(path, json)
}
