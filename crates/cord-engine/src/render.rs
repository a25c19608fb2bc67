//! The status-tree renderer: plain `eprintln!` output for the user running a session,
//! distinct from `tracing`'s operator-facing diagnostics. Redraws only when the rendered
//! text actually changes, so a quiet tree does not spam the terminal every poll interval.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use cord_core::NodeStatus;
use cord_store::NodeView;

fn status_style(status: NodeStatus) -> (&'static str, &'static str) {
    match status {
        NodeStatus::Pending => ("\x1b[2m", "o"),
        NodeStatus::Active => ("\x1b[33m", "*"),
        NodeStatus::Paused => ("\x1b[35m", "||"),
        NodeStatus::Complete => ("\x1b[32m", "v"),
        NodeStatus::Failed => ("\x1b[31m", "x"),
        NodeStatus::Cancelled => ("\x1b[2m", "-"),
    }
}

const RESET: &str = "\x1b[0m";

/// Render the full tree as ANSI-colored text, one line per node.
pub fn render_text(root: &NodeView) -> String {
    let mut out = String::new();
    let (color, icon) = status_style(root.node.status);
    out.push_str(&format!(
        "{color}{icon} {} {} [{}]{RESET}\n",
        root.node.id, root.node.objective, root.node.status
    ));
    let n = root.children.len();
    for (i, child) in root.children.iter().enumerate() {
        render_node(child, "", i + 1 == n, &mut out);
    }
    out
}

fn render_node(view: &NodeView, prefix: &str, is_last: bool, out: &mut String) {
    let (color, icon) = status_style(view.node.status);
    let branch = if is_last { "`-- " } else { "|-- " };
    out.push_str(&format!(
        "{prefix}{branch}{color}{icon} {} {} [{}]{RESET}\n",
        view.node.id, view.node.objective, view.node.status
    ));
    let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "|   " });
    let n = view.children.len();
    for (i, child) in view.children.iter().enumerate() {
        render_node(child, &child_prefix, i + 1 == n, out);
    }
}

/// Whether `text` differs from the last rendered text, updating `last` as a side effect.
/// Factored out of the engine so the dedup logic can be tested without capturing stderr.
pub fn should_redraw(last: &mut Option<u64>, text: &str) -> bool {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    let hash = hasher.finish();
    if *last == Some(hash) {
        false
    } else {
        *last = Some(hash);
        true
    }
}
