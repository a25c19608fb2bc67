//! Error taxonomy for the coordination kernel.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("node {0} not found")]
    NotFound(String),

    #[error("{target} is not in {agent}'s subtree — use `ask` to request the parent")]
    NotInSubtree { agent: String, target: String },

    #[error("bad state: {0}")]
    BadState(String),

    #[error("bad args: {0}")]
    BadArgs(String),

    #[error("dependency on {0} would create a cycle")]
    EdgeCycle(String),

    #[error("could not launch agent for {node}: {reason}")]
    SpawnFailure { node: String, reason: String },

    #[error("io error: {0}")]
    Io(String),

    #[error("json error: {0}")]
    Json(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e.to_string())
    }
}

impl Error {
    /// Render as the `{"error": "..."}` envelope the Tool Server returns on stdout.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "error": self.to_string() })
    }
}
