//! The Graph Store — persistent, concurrent, process-safe record of the coordination tree.

pub mod snapshot;
pub mod store;
pub mod view;

pub use store::GraphStore;
pub use view::NodeView;
