//! The Runtime Adapter interface — the polymorphic boundary between Cord's abstract
//! "launch this agent" request and a concrete subprocess-spawn plan for one vendor CLI.
//!
//! Per the spec, the concrete agent CLIs themselves are external collaborators; this crate
//! owns only the trait, the shared request/plan/capability types, and the registry that
//! resolves a runtime name to an adapter instance.

pub mod adapters;
mod registry;
mod stage;

use std::path::PathBuf;

use cord_core::NodeId;

pub use registry::{create_adapter, default_runtime, runtime_names};
pub use stage::{node_file_slug, write_json_file};

/// What a runtime adapter supports; lets callers warn instead of silently dropping a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeCapabilities {
    pub supports_model: bool,
    pub supports_budget: bool,
    pub supports_allowed_tools: bool,
    pub requires_mcp_config: bool,
}

/// Everything needed to launch one node's agent process.
#[derive(Debug, Clone)]
pub struct AgentLaunchRequest {
    pub node_id: NodeId,
    pub prompt: String,
    pub project_dir: PathBuf,
    pub work_dir: Option<PathBuf>,
    pub max_budget_usd: f64,
    pub model: Option<String>,
    /// Staging directory for per-node config/prompt files, usually `<project_dir>/.cord`.
    pub stage_dir: PathBuf,
}

/// A resolved subprocess launch plan: the scheduler hands this straight to the Supervisor.
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    pub cmd: Vec<String>,
    pub cwd: PathBuf,
    pub env: Option<Vec<(String, String)>>,
}

/// Runtime-specific adapter that builds a launch plan for one agent CLI.
pub trait RuntimeAdapter: Send + Sync {
    fn name(&self) -> &'static str;
    fn default_model(&self) -> Option<&'static str>;
    fn capabilities(&self) -> RuntimeCapabilities;

    /// Build the concrete launch plan. May stage config/prompt files on disk as a side effect.
    fn plan(&self, request: &AgentLaunchRequest) -> std::io::Result<LaunchPlan>;
}
