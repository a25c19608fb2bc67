use crate::stage::node_file_slug;
use crate::{AgentLaunchRequest, LaunchPlan, RuntimeAdapter, RuntimeCapabilities};

/// Talks to the Codex App Server worker directly, bypassing the generic MCP config dance —
/// the worker is given the tool-server's connection args as `--mcp-arg` flags instead.
pub struct CodexAppServerAdapter;

impl RuntimeAdapter for CodexAppServerAdapter {
    fn name(&self) -> &'static str {
        "codex-app-server"
    }

    fn default_model(&self) -> Option<&'static str> {
        Some("gpt-5.2-codex")
    }

    fn capabilities(&self) -> RuntimeCapabilities {
        RuntimeCapabilities {
            supports_model: true,
            supports_budget: false,
            supports_allowed_tools: false,
            requires_mcp_config: false,
        }
    }

    fn plan(&self, request: &AgentLaunchRequest) -> std::io::Result<LaunchPlan> {
        std::fs::create_dir_all(&request.stage_dir)?;
        let prompt_path = request
            .stage_dir
            .join(format!("prompt-{}.txt", node_file_slug(request.node_id)));
        std::fs::write(&prompt_path, &request.prompt)?;

        let work_dir = request
            .work_dir
            .clone()
            .unwrap_or_else(|| request.project_dir.clone());

        let mut cmd = vec![
            "cord-codex-app-server-worker".to_string(),
            "--prompt-file".to_string(),
            prompt_path.display().to_string(),
            "--project-dir".to_string(),
            work_dir.display().to_string(),
            "--mcp-arg".to_string(),
            "tool-server".to_string(),
            "--mcp-arg".to_string(),
            format!("--agent-id={}", request.node_id),
        ];

        if let Some(model) = &request.model {
            cmd.push("--model".to_string());
            cmd.push(model.clone());
        }

        Ok(LaunchPlan {
            cmd,
            cwd: work_dir,
            env: None,
        })
    }
}
