//! The Process Supervisor — tracks live agent subprocesses and reaps them without ever
//! blocking the engine's tick loop on a specific child.

use std::collections::HashMap;
use std::collections::HashSet;

use cord_core::NodeId;
use tokio::process::Child;

/// One exited child, with everything the engine needs to resolve its node.
pub struct Exit {
    pub id: NodeId,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

struct Tracked {
    child: Child,
}

/// Tracks one subprocess per active node. Never awaits a specific child directly —
/// `poll_exits` uses `try_wait`, so a stuck child never stalls the engine.
#[derive(Default)]
pub struct ProcessSupervisor {
    processes: HashMap<NodeId, Tracked>,
}

impl ProcessSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin tracking a just-spawned child for `id`. The child must have been spawned with
    /// piped stdout/stderr for `poll_exits` to drain them at exit.
    pub fn register(&mut self, id: NodeId, child: Child) {
        self.processes.insert(id, Tracked { child });
    }

    /// Non-blocking: returns every child that has exited since the last call, draining its
    /// stdout/stderr and deregistering it. Children still running are left in place.
    pub async fn poll_exits(&mut self) -> Vec<Exit> {
        let mut exited = Vec::new();
        let mut still_running = HashMap::new();

        for (id, mut tracked) in self.processes.drain() {
            match tracked.child.try_wait() {
                Ok(Some(status)) => {
                    let stdout = read_pipe(tracked.child.stdout.take()).await;
                    let stderr = read_pipe(tracked.child.stderr.take()).await;
                    exited.push(Exit {
                        id,
                        exit_code: status.code(),
                        stdout,
                        stderr,
                    });
                }
                Ok(None) => {
                    still_running.insert(id, tracked);
                }
                Err(e) => {
                    tracing::warn!(node = %id, error = %e, "failed to poll child process");
                    still_running.insert(id, tracked);
                }
            }
        }

        self.processes = still_running;
        exited
    }

    /// Send a kill signal to `id`'s child. Returns false if no such child is tracked.
    pub async fn cancel(&mut self, id: NodeId) -> bool {
        match self.processes.get_mut(&id) {
            Some(tracked) => {
                let _ = tracked.child.kill().await;
                true
            }
            None => false,
        }
    }

    /// Cancel every tracked child.
    pub async fn cancel_all(&mut self) {
        let ids: Vec<NodeId> = self.processes.keys().copied().collect();
        for id in ids {
            self.cancel(id).await;
        }
    }

    pub fn active_ids(&self) -> HashSet<NodeId> {
        self.processes.keys().copied().collect()
    }

    pub fn active_count(&self) -> usize {
        self.processes.len()
    }

    pub fn is_active(&self, id: NodeId) -> bool {
        self.processes.contains_key(&id)
    }
}

async fn read_pipe(pipe: Option<impl tokio::io::AsyncRead + Unpin>) -> String {
    use tokio::io::AsyncReadExt;
    match pipe {
        Some(mut p) => {
            let mut buf = Vec::new();
            let _ = p.read_to_end(&mut buf).await;
            String::from_utf8_lossy(&buf).to_string()
        }
        None => String::new(),
    }
}
