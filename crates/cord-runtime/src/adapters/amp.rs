use crate::adapters::MCP_TOOLS;
use crate::stage::{mcp_config, node_file_slug, write_json_file};
use crate::{AgentLaunchRequest, LaunchPlan, RuntimeAdapter, RuntimeCapabilities};

/// Amp doesn't expose model/budget overrides; requests carrying either are honored as no-ops
/// and logged so the operator isn't left wondering why a flag had no effect.
pub struct AmpAdapter;

impl RuntimeAdapter for AmpAdapter {
    fn name(&self) -> &'static str {
        "amp"
    }

    fn default_model(&self) -> Option<&'static str> {
        None
    }

    fn capabilities(&self) -> RuntimeCapabilities {
        RuntimeCapabilities {
            supports_model: false,
            supports_budget: false,
            supports_allowed_tools: false,
            requires_mcp_config: true,
        }
    }

    fn plan(&self, request: &AgentLaunchRequest) -> std::io::Result<LaunchPlan> {
        if request.model.is_some() {
            tracing::warn!("--model is not supported by the amp runtime; ignoring");
        }
        if request.max_budget_usd != 2.0 {
            tracing::warn!("--budget is not supported by the amp runtime; ignoring");
        }

        let slug = node_file_slug(request.node_id);
        let mcp_path = request.stage_dir.join(format!("mcp-{slug}.json"));
        let settings_path = request.stage_dir.join(format!("amp-settings-{slug}.json"));

        // Amp expects the server map directly rather than wrapped in `mcpServers`.
        let servers = mcp_config(request.node_id)["mcpServers"].clone();
        write_json_file(&mcp_path, &servers)?;

        let mut settings = load_base_settings();
        let enabled = settings
            .get("amp.tools.enable")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();
        let mut enabled: Vec<serde_json::Value> = enabled;
        for tool in MCP_TOOLS {
            if !enabled.iter().any(|v| v.as_str() == Some(tool)) {
                enabled.push(serde_json::Value::String((*tool).to_string()));
            }
        }
        settings["amp.tools.enable"] = serde_json::Value::Array(enabled);
        write_json_file(&settings_path, &settings)?;

        let cmd = vec![
            "amp".to_string(),
            "-x".to_string(),
            request.prompt.clone(),
            "--mcp-config".to_string(),
            mcp_path.display().to_string(),
            "--settings-file".to_string(),
            settings_path.display().to_string(),
            "--no-color".to_string(),
        ];

        let env = Some(vec![("TERM".to_string(), "dumb".to_string())]);
        let cwd = request
            .work_dir
            .clone()
            .unwrap_or_else(|| request.project_dir.clone());
        Ok(LaunchPlan { cmd, cwd, env })
    }
}

fn load_base_settings() -> serde_json::Value {
    let Some(path) = std::env::var_os("AMP_SETTINGS_FILE")
        .map(std::path::PathBuf::from)
        .or_else(|| dirs::config_dir().map(|d| d.join("amp/settings.json")))
    else {
        return serde_json::json!({});
    };
    let Ok(raw) = std::fs::read_to_string(&path) else {
        return serde_json::json!({});
    };
    match serde_json::from_str(&raw) {
        Ok(serde_json::Value::Object(map)) => serde_json::Value::Object(map),
        _ => {
            tracing::warn!(path = %path.display(), "amp settings file is not a JSON object; ignoring");
            serde_json::json!({})
        }
    }
}
