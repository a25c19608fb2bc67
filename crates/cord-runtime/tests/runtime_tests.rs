use cord_core::NodeId;
use cord_runtime::{create_adapter, default_runtime, runtime_names, AgentLaunchRequest};

fn request(stage_root: &std::path::Path) -> AgentLaunchRequest {
    AgentLaunchRequest {
        node_id: NodeId::new(7),
        prompt: "do the thing".to_string(),
        project_dir: stage_root.to_path_buf(),
        work_dir: None,
        max_budget_usd: 2.0,
        model: None,
        stage_dir: stage_root.join(".cord"),
    }
}

#[test]
fn default_runtime_is_codex_app_server() {
    assert_eq!(default_runtime(), "codex-app-server");
    assert!(runtime_names().contains(&"codex-app-server"));
}

#[test]
fn unknown_runtime_name_is_rejected() {
    assert!(create_adapter("nonexistent").is_err());
}

#[test]
fn claude_plan_stages_mcp_config_and_sets_model_flag() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = create_adapter("claude").unwrap();
    let plan = adapter.plan(&request(dir.path())).unwrap();

    assert_eq!(plan.cmd[0], "claude");
    assert!(plan.cmd.contains(&"--model".to_string()));
    assert!(plan.cmd.contains(&"sonnet".to_string()));
    let config_path = dir.path().join(".cord").join("mcp-7.json");
    assert!(config_path.exists());
}

#[test]
fn amp_plan_omits_model_and_budget_flags() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = create_adapter("amp").unwrap();
    let plan = adapter.plan(&request(dir.path())).unwrap();

    assert_eq!(plan.cmd[0], "amp");
    assert!(!plan.cmd.iter().any(|a| a == "--model"));
    let settings_path = dir.path().join(".cord").join("amp-settings-7.json");
    assert!(settings_path.exists());
}

#[test]
fn codex_plan_writes_prompt_file_and_passes_mcp_args() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = create_adapter("codex-app-server").unwrap();
    let plan = adapter.plan(&request(dir.path())).unwrap();

    let prompt_path = dir.path().join(".cord").join("prompt-7.txt");
    assert!(prompt_path.exists());
    assert_eq!(std::fs::read_to_string(prompt_path).unwrap(), "do the thing");
    assert!(plan.cmd.iter().any(|a| a == "--agent-id=#7"));
}
