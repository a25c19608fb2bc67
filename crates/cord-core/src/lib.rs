//! Cord Core - Types, status automaton, and error handling

pub mod error;
pub mod node;

pub use error::{Error, Result};
pub use node::{Node, NodeId, NodeKind, NodeStatus};
