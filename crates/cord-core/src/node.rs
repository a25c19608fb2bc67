//! Node identity, kind, and status automaton shared across the coordination kernel.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A node's identity: a dense positive integer, rendered externally as `#N` — including in
/// JSON, where it serializes as the string `"#N"` rather than a bare number, matching every
/// other place the coordination tree names a node.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct NodeId(u64);

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<NodeId>().map_err(D::Error::custom)
    }
}

impl NodeId {
    pub fn new(n: u64) -> Self {
        Self(n)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = Error;

    /// Accepts both `#N` and bare `N` textual forms.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.strip_prefix('#').unwrap_or(s);
        trimmed
            .parse::<u64>()
            .map(NodeId)
            .map_err(|_| Error::BadArgs(format!("invalid node id: {s}")))
    }
}

/// The role a node plays in the tree.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// The root of the tree.
    Goal,
    /// A child that receives no sibling context.
    Spawn,
    /// A child that inherits completed siblings' results.
    Fork,
    /// A node answered by a human rather than a subprocess.
    Ask,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeKind::Goal => "goal",
            NodeKind::Spawn => "spawn",
            NodeKind::Fork => "fork",
            NodeKind::Ask => "ask",
        };
        write!(f, "{s}")
    }
}

/// A node's lifecycle state. `Complete`, `Failed`, and `Cancelled` are terminal.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Pending,
    Active,
    Paused,
    Complete,
    Failed,
    Cancelled,
}

impl NodeStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            NodeStatus::Complete | NodeStatus::Failed | NodeStatus::Cancelled
        )
    }

    /// Whether the automaton in the spec allows the edge `self -> next`.
    ///
    /// ```text
    /// pending -> active | cancelled
    /// active  -> complete | failed | paused | cancelled
    /// paused  -> pending | cancelled
    /// ```
    /// This is the edge table only; it has no self-loops. A caller setting a node to the
    /// status it already holds is an idempotent no-op handled above this layer, not a
    /// transition this automaton needs to approve.
    pub fn can_transition_to(self, next: NodeStatus) -> bool {
        matches!(
            (self, next),
            (NodeStatus::Pending, NodeStatus::Active)
                | (NodeStatus::Pending, NodeStatus::Cancelled)
                | (NodeStatus::Active, NodeStatus::Complete)
                | (NodeStatus::Active, NodeStatus::Failed)
                | (NodeStatus::Active, NodeStatus::Paused)
                | (NodeStatus::Active, NodeStatus::Cancelled)
                | (NodeStatus::Paused, NodeStatus::Pending)
                | (NodeStatus::Paused, NodeStatus::Cancelled)
        )
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeStatus::Pending => "pending",
            NodeStatus::Active => "active",
            NodeStatus::Paused => "paused",
            NodeStatus::Complete => "complete",
            NodeStatus::Failed => "failed",
            NodeStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// A unit of work in the coordination tree.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub objective: String,
    pub status: NodeStatus,
    pub parent: Option<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    pub returns: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub result: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Node {
    pub fn new(
        id: NodeId,
        kind: NodeKind,
        objective: impl Into<String>,
        parent: Option<NodeId>,
        prompt: Option<String>,
        returns: Option<String>,
        status: NodeStatus,
    ) -> Self {
        let now = chrono::Utc::now();
        Self {
            id,
            kind,
            objective: objective.into(),
            status,
            parent,
            prompt,
            returns: returns.unwrap_or_else(|| "text".to_string()),
            result: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
