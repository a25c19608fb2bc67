//! JSON-shaped views over a node, used for `tree()` and the Tool Server's `read_*` replies.

use cord_core::{Node, NodeId};
use serde::Serialize;

/// A node plus its dependency edges and, when requested, its subtree.
#[derive(Clone, Debug, Serialize)]
pub struct NodeView {
    #[serde(flatten)]
    pub node: Node,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub blocked_by: Vec<NodeId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeView>,
}

impl NodeView {
    pub fn leaf(node: Node, blocked_by: Vec<NodeId>) -> Self {
        Self {
            node,
            blocked_by,
            children: Vec::new(),
        }
    }
}
