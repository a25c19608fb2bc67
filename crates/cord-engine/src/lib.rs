//! The Scheduler/Engine — the single cooperative control loop that seeds the root goal,
//! promotes ready nodes to running agents, reaps exited children, triggers synthesis, and
//! renders the tree for the person watching the run.

mod render;
mod tool_socket;

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use cord_core::{Error, NodeId, NodeKind, NodeStatus, Result};
use cord_runtime::{AgentLaunchRequest, RuntimeAdapter};
use cord_store::GraphStore;
use cord_supervisor::{Exit, ProcessSupervisor};
use tokio::task::JoinHandle;

/// Everything the engine needs that isn't part of the goal itself.
pub struct EngineConfig {
    pub project_dir: PathBuf,
    pub runtime: String,
    pub model: Option<String>,
    pub max_budget_usd: f64,
    pub poll_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            project_dir: PathBuf::from("."),
            runtime: cord_runtime::default_runtime().to_string(),
            model: None,
            max_budget_usd: 2.0,
            poll_interval: Duration::from_secs(2),
        }
    }
}

pub struct Engine {
    store: GraphStore,
    supervisor: ProcessSupervisor,
    adapter: Box<dyn RuntimeAdapter>,
    config: EngineConfig,
    stage_dir: PathBuf,
    /// When each currently-tracked child was launched, so a clean exit can tell whether the
    /// node's result was already set live (via `complete`) during the run, rather than only
    /// at creation — `created_at` would make an idle-then-relaunched node look untouched.
    launched_at: HashMap<NodeId, chrono::DateTime<chrono::Utc>>,
    last_render_hash: Option<u64>,
    tool_socket: Option<JoinHandle<()>>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let adapter = cord_runtime::create_adapter(&config.runtime).map_err(Error::BadArgs)?;
        Self::with_adapter(config, adapter)
    }

    /// Construct with an explicit adapter, bypassing the runtime-name registry. Exists so
    /// tests can drive the engine with a stand-in adapter instead of a real vendor CLI.
    pub fn with_adapter(config: EngineConfig, adapter: Box<dyn RuntimeAdapter>) -> Result<Self> {
        let stage_dir = config.project_dir.join(".cord");
        let db_path = stage_dir.join("cord.db");
        let store = GraphStore::open(Some(&db_path))?;
        Ok(Self {
            store,
            supervisor: ProcessSupervisor::new(),
            adapter,
            config,
            stage_dir,
            launched_at: HashMap::new(),
            last_render_hash: None,
            tool_socket: None,
        })
    }

    /// Seed the root goal node and drive the run to quiescence, a stuck halt, or an
    /// interactive interrupt.
    pub async fn run(&mut self, goal: &str) -> Result<()> {
        self.tool_socket = Some(
            tool_socket::spawn_listener(&self.stage_dir, self.store.clone())
                .map_err(|e| Error::Io(e.to_string()))?,
        );

        let root = self
            .store
            .create_node(NodeKind::Goal, goal.to_string(), None, None, None, None, vec![])
            .await?;
        tracing::info!(node = %root, "seeded root goal");
        self.launch_node(root).await?;
        self.render_tree().await;

        loop {
            if self.store.is_quiescent().await {
                tracing::info!("run complete");
                break;
            }

            for exit in self.supervisor.poll_exits().await {
                self.handle_completion(exit).await?;
            }

            let ready = self.store.find_ready().await;
            for node in &ready {
                if self.supervisor.is_active(node.id) {
                    continue;
                }
                if node.kind == NodeKind::Ask {
                    self.handle_ask(node.id).await?;
                } else {
                    self.launch_node(node.id).await?;
                }
            }

            self.render_tree().await;

            if self.supervisor.active_count() == 0
                && ready.is_empty()
                && !self.store.is_quiescent().await
            {
                tracing::warn!("stuck: non-terminal nodes remain but nothing is ready or active");
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval) => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::warn!("interrupted; cancelling all tracked children");
                    self.interrupt_shutdown().await;
                    return Ok(());
                }
            }
        }

        if let Some(handle) = self.tool_socket.take() {
            handle.abort();
        }
        Ok(())
    }

    async fn launch_node(&mut self, id: NodeId) -> Result<()> {
        let prompt = cord_prompt::build_prompt(&self.store, id).await;
        self.store.set_status(id, NodeStatus::Active).await?;
        self.spawn_with_prompt(id, prompt).await
    }

    async fn launch_synthesis(&mut self, id: NodeId) -> Result<()> {
        let prompt = cord_prompt::build_synthesis_prompt(&self.store, id).await;
        self.spawn_with_prompt(id, prompt).await
    }

    async fn spawn_with_prompt(&mut self, id: NodeId, prompt: String) -> Result<()> {
        let request = AgentLaunchRequest {
            node_id: id,
            prompt,
            project_dir: self.config.project_dir.clone(),
            work_dir: None,
            max_budget_usd: self.config.max_budget_usd,
            model: self.config.model.clone(),
            stage_dir: self.stage_dir.clone(),
        };
        let plan = match self.adapter.plan(&request) {
            Ok(plan) => plan,
            Err(e) => return self.fail_spawn(id, e.to_string()).await,
        };

        let mut command = tokio::process::Command::new(&plan.cmd[0]);
        command
            .args(&plan.cmd[1..])
            .current_dir(&plan.cwd)
            .env("CORD_TOOLS_SOCK", tool_socket::socket_path(&self.stage_dir))
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());
        if let Some(env) = &plan.env {
            for (k, v) in env {
                command.env(k, v);
            }
        }

        let child = match command.spawn() {
            Ok(child) => child,
            Err(e) => return self.fail_spawn(id, e.to_string()).await,
        };

        tracing::info!(node = %id, "launched agent");
        self.launched_at.insert(id, chrono::Utc::now());
        self.supervisor.register(id, child);
        Ok(())
    }

    /// A node whose agent could not even be started (missing binary, bad launch plan, ...)
    /// is failed in place rather than aborting the run — a launch failure is just another
    /// way for a node to fail, not a reason to bring the whole engine down.
    async fn fail_spawn(&mut self, id: NodeId, reason: String) -> Result<()> {
        tracing::warn!(node = %id, reason = %reason, "could not launch agent; failing node");
        if let Some(node) = self.store.get(id).await {
            if !node.status.is_terminal() {
                self.store.set_status(id, NodeStatus::Failed).await?;
            }
        }
        self.check_synthesis(id).await
    }

    async fn handle_completion(&mut self, exit: Exit) -> Result<()> {
        let launched_at = self.launched_at.remove(&exit.id);
        let Some(node) = self.store.get(exit.id).await else {
            return Ok(());
        };

        match exit.exit_code {
            Some(0) => {
                let completed_live = launched_at.map(|t| node.updated_at > t).unwrap_or(false);
                if !completed_live {
                    self.store
                        .complete(exit.id, truncate(&exit.stdout, 500))
                        .await?;
                }
                tracing::info!(node = %exit.id, "agent exited cleanly");
                self.check_synthesis(exit.id).await?;
            }
            other => {
                tracing::warn!(node = %exit.id, exit_code = ?other, stderr = %exit.stderr, "agent exited with an error");
                if !node.status.is_terminal() {
                    self.store.set_status(exit.id, NodeStatus::Failed).await?;
                }
            }
        }
        Ok(())
    }

    /// Triggered when `child_id` becomes terminal: if every child of its parent is now
    /// terminal, either relaunch the parent for synthesis (at least one child completed) or
    /// fail the parent (none did). A leaf with no parent, or a parent still awaiting other
    /// children, is a no-op.
    async fn check_synthesis(&mut self, child_id: NodeId) -> Result<()> {
        let Some(child) = self.store.get(child_id).await else {
            return Ok(());
        };
        let Some(parent_id) = child.parent else {
            return Ok(());
        };

        let siblings = self.store.children(parent_id).await;
        if siblings.is_empty() || !siblings.iter().all(|s| s.status.is_terminal()) {
            return Ok(());
        }
        // Another sibling finishing in the same poll_exits drain may have already
        // triggered this; the parent is already running its synthesis pass.
        if self.supervisor.is_active(parent_id) {
            return Ok(());
        }

        if siblings.iter().any(|s| s.status == NodeStatus::Complete) {
            tracing::info!(node = %parent_id, "all children terminal; relaunching for synthesis");
            self.launch_synthesis(parent_id).await
        } else {
            tracing::info!(node = %parent_id, "all children terminal, none completed; failing parent");
            if let Some(parent) = self.store.get(parent_id).await {
                if !parent.status.is_terminal() {
                    self.store.set_status(parent_id, NodeStatus::Failed).await?;
                }
            }
            Ok(())
        }
    }

    /// `ask` nodes never spawn a subprocess: block the tick, read the answer from the
    /// controlling terminal, and complete the node directly.
    async fn handle_ask(&mut self, id: NodeId) -> Result<()> {
        let Some(node) = self.store.get(id).await else {
            return Ok(());
        };
        self.store.set_status(id, NodeStatus::Active).await?;

        let prompt = node.prompt.clone().unwrap_or_default();
        let default = default_answer(&prompt);

        eprintln!("\n\x1b[36m? {}\x1b[0m", node.objective);
        if !prompt.is_empty() {
            eprintln!("{prompt}");
        }
        eprint!("> ");
        {
            use std::io::Write;
            let _ = std::io::stderr().flush();
        }

        let mut line = String::new();
        let _ = std::io::stdin().read_line(&mut line);
        let trimmed = line.trim();
        let answer = if trimmed.is_empty() {
            default.unwrap_or_else(|| "(no answer)".to_string())
        } else {
            trimmed.to_string()
        };

        self.store.complete(id, answer).await?;
        self.check_synthesis(id).await
    }

    async fn interrupt_shutdown(&mut self) {
        self.supervisor.cancel_all().await;
        for node in self.store.all().await {
            if node.status == NodeStatus::Active {
                let _ = self.store.set_status(node.id, NodeStatus::Cancelled).await;
            }
        }
        self.render_tree().await;
        if let Some(handle) = self.tool_socket.take() {
            handle.abort();
        }
    }

    async fn render_tree(&mut self) {
        let Some(tree) = self.store.tree().await else {
            return;
        };
        let text = render::render_text(&tree);
        if render::should_redraw(&mut self.last_render_hash, &text) {
            eprint!("{text}");
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect()
    }
}

/// Parses a `Default: <value>` line out of an ask node's folded prompt, as the Tool Server
/// writes it when `ask` is called with a `default`.
fn default_answer(prompt: &str) -> Option<String> {
    prompt
        .lines()
        .find_map(|line| line.strip_prefix("Default: ").map(str::to_string))
}
