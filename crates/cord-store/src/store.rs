//! In-memory, mutex-serialized implementation of the Graph Store.
//!
//! A single `tokio::sync::Mutex` guards the whole tree, so every operation below runs under
//! one critical section — the same serializability a single SQLite connection gives the
//! original implementation, without needing a database crate for a store that the spec itself
//! says need not survive a restart.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cord_core::{Error, Node, NodeId, NodeKind, NodeStatus, Result};
use tokio::sync::Mutex;

use crate::snapshot::{self, Snapshot};
use crate::view::NodeView;

struct Inner {
    nodes: HashMap<NodeId, Node>,
    /// node -> the ids it depends on.
    deps: HashMap<NodeId, Vec<NodeId>>,
    /// parent -> ordered child ids (insertion order, which tracks id order since ids are
    /// assigned monotonically).
    children: HashMap<Option<NodeId>, Vec<NodeId>>,
    next_id: u64,
    root: Option<NodeId>,
}

impl Inner {
    fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            deps: HashMap::new(),
            children: HashMap::new(),
            next_id: 1,
            root: None,
        }
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(&id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// True if `target` is a proper descendant of `ancestor` in the parent tree.
    fn is_descendant(&self, ancestor: NodeId, target: NodeId) -> bool {
        let mut stack: Vec<NodeId> = self
            .children
            .get(&Some(ancestor))
            .cloned()
            .unwrap_or_default();
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            if let Some(kids) = self.children.get(&Some(id)) {
                stack.extend(kids.iter().copied());
            }
        }
        false
    }

    /// Whether the dependency DAG reachable from `depends_on` already contains a cycle.
    /// Ids are assigned monotonically and a node's `depends_on` is fixed at creation, so no
    /// existing edge can point at a node created later — in this store a cycle can only ever
    /// arise from corrupted state, but the new edges are still checked against the existing
    /// graph rather than assumed safe.
    fn would_cycle(&self, depends_on: &[NodeId]) -> bool {
        fn visit(
            deps: &HashMap<NodeId, Vec<NodeId>>,
            id: NodeId,
            on_stack: &mut std::collections::HashSet<NodeId>,
            done: &mut std::collections::HashSet<NodeId>,
        ) -> bool {
            if done.contains(&id) {
                return false;
            }
            if !on_stack.insert(id) {
                return true;
            }
            if let Some(next) = deps.get(&id) {
                for &n in next {
                    if visit(deps, n, on_stack, done) {
                        return true;
                    }
                }
            }
            on_stack.remove(&id);
            done.insert(id);
            false
        }

        let mut on_stack = std::collections::HashSet::new();
        let mut done = std::collections::HashSet::new();
        depends_on
            .iter()
            .any(|&id| visit(&self.deps, id, &mut on_stack, &mut done))
    }

    fn view(&self, id: NodeId) -> Result<NodeView> {
        let node = self.node(id)?.clone();
        let blocked_by = self.deps.get(&id).cloned().unwrap_or_default();
        let children = self
            .children
            .get(&Some(id))
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|cid| self.view(cid))
            .collect::<Result<Vec<_>>>()?;
        Ok(NodeView {
            node,
            blocked_by,
            children,
        })
    }

    fn to_snapshot(&self) -> Snapshot {
        let mut nodes: Vec<Node> = self.nodes.values().cloned().collect();
        nodes.sort_by_key(|n| n.id);
        let deps = self
            .deps
            .iter()
            .map(|(k, v)| (*k, v.clone()))
            .collect();
        Snapshot {
            next_id: self.next_id,
            nodes,
            deps,
        }
    }
}

/// Persistent, concurrent, process-safe store of the coordination tree.
#[derive(Clone)]
pub struct GraphStore {
    inner: Arc<Mutex<Inner>>,
    db_path: Option<PathBuf>,
}

impl GraphStore {
    /// Open a fresh store. If `db_path` is given, any existing snapshot at that path is
    /// discarded — each run starts with an empty tree.
    pub fn open(db_path: Option<impl AsRef<Path>>) -> std::io::Result<Self> {
        let db_path = db_path.map(|p| p.as_ref().to_path_buf());
        if let Some(path) = &db_path {
            if path.exists() {
                std::fs::remove_file(path)?;
            }
        }
        Ok(Self {
            inner: Arc::new(Mutex::new(Inner::new())),
            db_path,
        })
    }

    async fn snapshot(&self, inner: &Inner) {
        let Some(path) = &self.db_path else { return };
        if let Err(e) = snapshot::write(path, &inner.to_snapshot()) {
            tracing::warn!(error = %e, "failed to write store snapshot");
        }
    }

    pub async fn create_node(
        &self,
        kind: NodeKind,
        objective: impl Into<String>,
        parent: Option<NodeId>,
        prompt: Option<String>,
        returns: Option<String>,
        initial_status: Option<NodeStatus>,
        depends_on: Vec<NodeId>,
    ) -> Result<NodeId> {
        let mut inner = self.inner.lock().await;

        if let Some(p) = parent {
            inner.node(p)?;
        } else if inner.root.is_some() {
            return Err(Error::BadArgs(
                "a root already exists for this run".to_string(),
            ));
        }

        for dep in &depends_on {
            inner.node(*dep)?;
        }
        if inner.would_cycle(&depends_on) {
            let names = depends_on
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(Error::EdgeCycle(names));
        }

        let id = NodeId::new(inner.next_id);
        inner.next_id += 1;

        let status = initial_status.unwrap_or(NodeStatus::Pending);
        let node = Node::new(id, kind, objective, parent, prompt, returns, status);
        inner.nodes.insert(id, node);
        inner.children.entry(parent).or_default().push(id);
        if !depends_on.is_empty() {
            inner.deps.insert(id, depends_on);
        }
        if parent.is_none() {
            inner.root = Some(id);
        }

        self.snapshot(&inner).await;
        Ok(id)
    }

    pub async fn set_status(&self, id: NodeId, status: NodeStatus) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let node = inner.node_mut(id)?;
        if node.status == status {
            return Ok(());
        }
        if !node.status.can_transition_to(status) {
            return Err(Error::BadState(format!(
                "cannot transition {id} from {} to {status}",
                node.status
            )));
        }
        node.status = status;
        node.updated_at = chrono::Utc::now();
        self.snapshot(&inner).await;
        Ok(())
    }

    pub async fn modify(
        &self,
        id: NodeId,
        objective: Option<String>,
        prompt: Option<String>,
    ) -> Result<()> {
        if objective.is_none() && prompt.is_none() {
            return Err(Error::BadArgs(
                "modify requires at least one of objective or prompt".to_string(),
            ));
        }
        let mut inner = self.inner.lock().await;
        let node = inner.node_mut(id)?;
        if !matches!(node.status, NodeStatus::Pending | NodeStatus::Paused) {
            return Err(Error::BadState(format!(
                "{id} is {}; modify requires pending or paused",
                node.status
            )));
        }
        if let Some(o) = objective {
            node.objective = o;
        }
        if let Some(p) = prompt {
            node.prompt = Some(p);
        }
        node.updated_at = chrono::Utc::now();
        self.snapshot(&inner).await;
        Ok(())
    }

    pub async fn complete(&self, id: NodeId, result: impl Into<String>) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let node = inner.node_mut(id)?;
        if node.status != NodeStatus::Complete && !node.status.can_transition_to(NodeStatus::Complete) {
            return Err(Error::BadState(format!(
                "cannot complete {id} from {}",
                node.status
            )));
        }
        node.status = NodeStatus::Complete;
        node.result = result.into();
        node.updated_at = chrono::Utc::now();
        self.snapshot(&inner).await;
        Ok(())
    }

    pub async fn get(&self, id: NodeId) -> Option<Node> {
        self.inner.lock().await.nodes.get(&id).cloned()
    }

    pub async fn children(&self, id: NodeId) -> Vec<Node> {
        let inner = self.inner.lock().await;
        inner
            .children
            .get(&Some(id))
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter_map(|cid| inner.nodes.get(&cid).cloned())
            .collect()
    }

    pub async fn dependencies(&self, id: NodeId) -> Vec<NodeId> {
        self.inner.lock().await.deps.get(&id).cloned().unwrap_or_default()
    }

    pub async fn tree(&self) -> Option<NodeView> {
        let inner = self.inner.lock().await;
        let root = inner.root?;
        inner.view(root).ok()
    }

    pub async fn all(&self) -> Vec<Node> {
        let inner = self.inner.lock().await;
        let mut nodes: Vec<Node> = inner.nodes.values().cloned().collect();
        nodes.sort_by_key(|n| n.id);
        nodes
    }

    pub async fn find_ready(&self) -> Vec<Node> {
        let inner = self.inner.lock().await;
        let mut ready: Vec<Node> = inner
            .nodes
            .values()
            .filter(|n| {
                n.status == NodeStatus::Pending
                    && inner
                        .deps
                        .get(&n.id)
                        .map(|ds| {
                            ds.iter()
                                .all(|d| inner.nodes.get(d).map(|n| n.status) == Some(NodeStatus::Complete))
                        })
                        .unwrap_or(true)
            })
            .cloned()
            .collect();
        ready.sort_by_key(|n| n.id);
        ready
    }

    pub async fn is_quiescent(&self) -> bool {
        let inner = self.inner.lock().await;
        inner.nodes.values().all(|n| n.status.is_terminal())
    }

    pub async fn goal_chain(&self, id: NodeId) -> Vec<(NodeId, String)> {
        let inner = self.inner.lock().await;
        let mut chain = Vec::new();
        let mut current = inner.nodes.get(&id);
        while let Some(node) = current {
            chain.push((node.id, node.objective.clone()));
            current = node.parent.and_then(|p| inner.nodes.get(&p));
        }
        chain.reverse();
        chain
    }

    pub async fn completed_results(&self, ids: &[NodeId]) -> HashMap<NodeId, String> {
        let inner = self.inner.lock().await;
        ids.iter()
            .filter_map(|id| {
                let node = inner.nodes.get(id)?;
                if node.status == NodeStatus::Complete && !node.result.is_empty() {
                    Some((*id, node.result.clone()))
                } else {
                    None
                }
            })
            .collect()
    }

    /// Whether `target` is a proper descendant of `ancestor` (the Tool Server's authority rule).
    pub async fn is_descendant(&self, ancestor: NodeId, target: NodeId) -> bool {
        self.inner.lock().await.is_descendant(ancestor, target)
    }
}
