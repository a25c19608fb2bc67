use crate::adapters::{AmpAdapter, ClaudeAdapter, CodexAppServerAdapter};
use crate::RuntimeAdapter;

const DEFAULT_RUNTIME: &str = "codex-app-server";

pub fn runtime_names() -> &'static [&'static str] {
    &["claude", "codex-app-server", "amp"]
}

pub fn default_runtime() -> &'static str {
    DEFAULT_RUNTIME
}

/// Resolve a runtime name to its adapter. Errors name the supported set.
pub fn create_adapter(runtime: &str) -> Result<Box<dyn RuntimeAdapter>, String> {
    match runtime {
        "claude" => Ok(Box::new(ClaudeAdapter)),
        "codex-app-server" => Ok(Box::new(CodexAppServerAdapter)),
        "amp" => Ok(Box::new(AmpAdapter)),
        other => Err(format!(
            "unsupported runtime: {other}. Expected one of: {}",
            runtime_names().join(", ")
        )),
    }
}
