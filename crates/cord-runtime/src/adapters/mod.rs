pub mod amp;
pub mod claude;
pub mod codex_app_server;

pub use amp::AmpAdapter;
pub use claude::ClaudeAdapter;
pub use codex_app_server::CodexAppServerAdapter;

/// Tool names the agent CLI must be allowed to call, in the vendor's MCP naming convention.
pub const MCP_TOOLS: &[&str] = &[
    "mcp__cord__read_tree",
    "mcp__cord__read_node",
    "mcp__cord__spawn",
    "mcp__cord__fork",
    "mcp__cord__ask",
    "mcp__cord__complete",
    "mcp__cord__stop",
    "mcp__cord__pause",
    "mcp__cord__resume",
    "mcp__cord__modify",
];
