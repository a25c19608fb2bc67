use crate::adapters::MCP_TOOLS;
use crate::stage::{mcp_config, node_file_slug, write_json_file};
use crate::{AgentLaunchRequest, LaunchPlan, RuntimeAdapter, RuntimeCapabilities};

pub struct ClaudeAdapter;

impl RuntimeAdapter for ClaudeAdapter {
    fn name(&self) -> &'static str {
        "claude"
    }

    fn default_model(&self) -> Option<&'static str> {
        Some("sonnet")
    }

    fn capabilities(&self) -> RuntimeCapabilities {
        RuntimeCapabilities {
            supports_model: true,
            supports_budget: true,
            supports_allowed_tools: true,
            requires_mcp_config: true,
        }
    }

    fn plan(&self, request: &AgentLaunchRequest) -> std::io::Result<LaunchPlan> {
        let resolved_model = request
            .model
            .clone()
            .unwrap_or_else(|| self.default_model().unwrap().to_string());

        let config_path = request
            .stage_dir
            .join(format!("mcp-{}.json", node_file_slug(request.node_id)));
        write_json_file(&config_path, &mcp_config(request.node_id))?;

        let cmd = vec![
            "claude".to_string(),
            "-p".to_string(),
            request.prompt.clone(),
            "--model".to_string(),
            resolved_model,
            "--mcp-config".to_string(),
            config_path.display().to_string(),
            "--allowedTools".to_string(),
            MCP_TOOLS.join(" "),
            "--dangerously-skip-permissions".to_string(),
            "--max-budget-usd".to_string(),
            request.max_budget_usd.to_string(),
        ];

        let cwd = request
            .work_dir
            .clone()
            .unwrap_or_else(|| request.project_dir.clone());
        Ok(LaunchPlan { cmd, cwd, env: None })
    }
}
