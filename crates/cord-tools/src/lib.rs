//! The Tool Server — one instance per live agent, serving a fixed catalogue of
//! authority-checked Graph Store operations over a framed JSON message stream.
//!
//! A server never crashes on a bad request: every error is caught and rendered as
//! `{"error": "..."}` on the wire, exactly like a normal reply.

use cord_core::{Error, NodeId, NodeKind, NodeStatus};
use cord_store::GraphStore;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Serves the tool catalogue on behalf of one running agent, acting as `agent_id`.
pub struct ToolServer {
    store: GraphStore,
    agent_id: NodeId,
}

impl ToolServer {
    pub fn new(store: GraphStore, agent_id: NodeId) -> Self {
        Self { store, agent_id }
    }

    /// Read framed (line-delimited) JSON requests from `input` and write one JSON response
    /// per line to `output`, until `input` reaches EOF. Each line is `{"op": "...", ...args}`.
    pub async fn serve<R, W>(&self, input: R, mut output: W) -> std::io::Result<()>
    where
        R: tokio::io::AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = BufReader::new(input).lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let response = match serde_json::from_str::<Value>(&line) {
                Ok(request) => self.dispatch(request).await,
                Err(e) => Error::Json(e.to_string()).to_json(),
            };
            output
                .write_all(format!("{response}\n").as_bytes())
                .await?;
            output.flush().await?;
        }
        Ok(())
    }

    /// Handle one already-parsed request and produce its JSON reply. Never returns `Err` —
    /// failures are folded into the `{"error": "..."}` envelope on the happy path's `Ok`.
    pub async fn dispatch(&self, request: Value) -> Value {
        let op = request.get("op").and_then(|v| v.as_str()).unwrap_or("");
        self.run(op, &request)
            .await
            .unwrap_or_else(|e| e.to_json())
    }

    async fn run(&self, op: &str, args: &Value) -> cord_core::Result<Value> {
        match op {
            "read_tree" => self.read_tree().await,
            "read_node" => self.read_node(args).await,
            "spawn" => self.create_child(args, NodeKind::Spawn).await,
            "fork" => self.create_child(args, NodeKind::Fork).await,
            "ask" => self.ask(args).await,
            "complete" => self.complete(args).await,
            "stop" => self.stop(args).await,
            "pause" => self.pause(args).await,
            "resume" => self.resume(args).await,
            "modify" => self.modify(args).await,
            other => Err(Error::BadArgs(format!("unknown operation: {other}"))),
        }
    }

    async fn read_tree(&self) -> cord_core::Result<Value> {
        match self.store.tree().await {
            Some(view) => Ok(serde_json::to_value(view)?),
            None => Err(Error::NotFound("(no root yet)".to_string())),
        }
    }

    async fn read_node(&self, args: &Value) -> cord_core::Result<Value> {
        let id = parse_id(args, "id")?;
        let node = self
            .store
            .get(id)
            .await
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        let blocked_by = self.store.dependencies(id).await;
        Ok(serde_json::to_value(cord_store::NodeView::leaf(
            node, blocked_by,
        ))?)
    }

    async fn create_child(&self, args: &Value, kind: NodeKind) -> cord_core::Result<Value> {
        let objective = args
            .get("objective")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::BadArgs("objective is required".to_string()))?
            .to_string();
        let prompt = args
            .get("prompt")
            .and_then(|v| v.as_str())
            .map(String::from);
        let returns = args
            .get("returns")
            .and_then(|v| v.as_str())
            .map(String::from);
        let depends_on = parse_id_list(args, "depends_on")?;

        let id = self
            .store
            .create_node(
                kind,
                objective.clone(),
                Some(self.agent_id),
                prompt,
                returns,
                None,
                depends_on,
            )
            .await?;

        Ok(json!({ "created": id.to_string(), "objective": objective }))
    }

    async fn ask(&self, args: &Value) -> cord_core::Result<Value> {
        let question = args
            .get("question")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::BadArgs("question is required".to_string()))?
            .to_string();
        let options: Vec<String> = args
            .get("options")
            .and_then(|v| v.as_array())
            .map(|a| a.iter().filter_map(|v| v.as_str().map(String::from)).collect())
            .unwrap_or_default();
        let default = args.get("default").and_then(|v| v.as_str());

        let mut prompt = question.clone();
        if !options.is_empty() {
            prompt.push_str(&format!("\nOptions: {}", options.join(", ")));
        }
        if let Some(d) = default {
            prompt.push_str(&format!("\nDefault: {d}"));
        }

        let id = self
            .store
            .create_node(
                NodeKind::Ask,
                question.clone(),
                Some(self.agent_id),
                Some(prompt),
                None,
                Some(NodeStatus::Pending),
                vec![],
            )
            .await?;

        Ok(json!({ "created": id.to_string(), "question": question }))
    }

    async fn complete(&self, args: &Value) -> cord_core::Result<Value> {
        let result = args
            .get("result")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        self.store.complete(self.agent_id, result).await?;
        Ok(json!({ "completed": self.agent_id.to_string() }))
    }

    async fn stop(&self, args: &Value) -> cord_core::Result<Value> {
        let id = self.authorized_target(args).await?;
        self.store.set_status(id, NodeStatus::Cancelled).await?;
        Ok(json!({ "cancelled": id.to_string() }))
    }

    async fn pause(&self, args: &Value) -> cord_core::Result<Value> {
        let id = self.authorized_target(args).await?;
        let node = self.store.get(id).await.ok_or_else(|| Error::NotFound(id.to_string()))?;
        if node.status != NodeStatus::Active {
            return Err(Error::BadState(format!(
                "cannot pause {id}: status is {}, not active",
                node.status
            )));
        }
        self.store.set_status(id, NodeStatus::Paused).await?;
        Ok(json!({ "paused": id.to_string() }))
    }

    async fn resume(&self, args: &Value) -> cord_core::Result<Value> {
        let id = self.authorized_target(args).await?;
        let node = self.store.get(id).await.ok_or_else(|| Error::NotFound(id.to_string()))?;
        if node.status != NodeStatus::Paused {
            return Err(Error::BadState(format!(
                "cannot resume {id}: status is {}, not paused",
                node.status
            )));
        }
        self.store.set_status(id, NodeStatus::Pending).await?;
        Ok(json!({ "resumed": id.to_string() }))
    }

    async fn modify(&self, args: &Value) -> cord_core::Result<Value> {
        let id = self.authorized_target(args).await?;
        let objective = args
            .get("objective")
            .and_then(|v| v.as_str())
            .map(String::from);
        let prompt = args
            .get("prompt")
            .and_then(|v| v.as_str())
            .map(String::from);
        self.store.modify(id, objective, prompt).await?;
        Ok(json!({ "modified": id.to_string() }))
    }

    /// Parse `id` and enforce the authority rule: the target must be a proper descendant of
    /// this server's agent, never the agent's own node or an unrelated one.
    async fn authorized_target(&self, args: &Value) -> cord_core::Result<NodeId> {
        let id = parse_id(args, "id")?;
        self.store.get(id).await.ok_or_else(|| Error::NotFound(id.to_string()))?;
        if !self.store.is_descendant(self.agent_id, id).await {
            return Err(Error::NotInSubtree {
                agent: self.agent_id.to_string(),
                target: id.to_string(),
            });
        }
        Ok(id)
    }
}

fn parse_id(args: &Value, field: &str) -> cord_core::Result<NodeId> {
    let raw = args
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::BadArgs(format!("{field} is required")))?;
    raw.parse()
}

fn parse_id_list(args: &Value, field: &str) -> cord_core::Result<Vec<NodeId>> {
    match args.get(field) {
        None | Some(Value::Null) => Ok(vec![]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_str()
                    .ok_or_else(|| Error::BadArgs(format!("{field} entries must be strings")))
                    .and_then(|s| s.parse())
            })
            .collect(),
        Some(_) => Err(Error::BadArgs(format!("{field} must be an array of ids"))),
    }
}
