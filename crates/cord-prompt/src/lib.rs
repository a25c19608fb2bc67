//! The Prompt Assembler — pure functions from `(store, node)` to the text handed to an agent.

use cord_core::{NodeId, NodeKind};
use cord_store::GraphStore;

/// Build the full prompt for an agent about to be launched as `node_id`.
///
/// Composes, in order: identity, goal chain, injected dependency results, fork-sibling
/// context, the node's own prompt, the tool catalogue, and output-format instructions.
/// Returns an empty string if the node does not exist.
pub async fn build_prompt(store: &GraphStore, node_id: NodeId) -> String {
    let Some(node) = store.get(node_id).await else {
        return String::new();
    };

    let mut parts: Vec<String> = Vec::new();

    parts.push(format!("You are node {node_id} in a coordination tree."));
    parts.push(format!("Your objective: {}", node.objective));
    parts.push(String::new());

    let goal_chain = store.goal_chain(node_id).await;
    if goal_chain.len() > 1 {
        parts.push("Goal chain:".to_string());
        for (i, (id, objective)) in goal_chain.iter().enumerate() {
            let indent = "  ".repeat(i);
            let marker = if *id == node_id { " <- your task" } else { "" };
            parts.push(format!("  {indent}{id} \"{objective}\"{marker}"));
        }
        parts.push(String::new());
    }

    let depends_on = store.dependencies(node_id).await;
    if !depends_on.is_empty() {
        let results = store.completed_results(&depends_on).await;
        if !results.is_empty() {
            parts.push("Results from needed nodes:".to_string());
            parts.push(String::new());
            for dep_id in &depends_on {
                let Some(result) = results.get(dep_id) else {
                    continue;
                };
                let label = match store.get(*dep_id).await {
                    Some(dep) => format!("{dep_id} \"{}\"", dep.objective),
                    None => dep_id.to_string(),
                };
                parts.push(format!("--- {label} ---"));
                parts.push(result.clone());
                parts.push(String::new());
            }
        }
    }

    if node.kind == NodeKind::Fork {
        if let Some(parent) = node.parent {
            let siblings = store.children(parent).await;
            let sibling_ids: Vec<NodeId> = siblings
                .iter()
                .map(|s| s.id)
                .filter(|id| *id != node_id)
                .collect();
            let results = store.completed_results(&sibling_ids).await;
            if !results.is_empty() {
                parts.push("Results from sibling tasks:".to_string());
                parts.push(String::new());
                for sibling in &siblings {
                    if sibling.id == node_id {
                        continue;
                    }
                    let Some(result) = results.get(&sibling.id) else {
                        continue;
                    };
                    parts.push(format!("--- {} \"{}\" ---", sibling.id, sibling.objective));
                    parts.push(result.clone());
                    parts.push(String::new());
                }
            }
        }
    }

    if let Some(prompt) = &node.prompt {
        parts.push("Your task:".to_string());
        parts.push(prompt.clone());
        parts.push(String::new());
    }

    parts.push(tool_catalogue_block());
    parts.push(output_instructions(&node.returns));

    parts.join("\n")
}

/// Build the prompt used to relaunch a parent after all its children have reached a
/// terminal state, asking it to synthesize their results into a final answer.
pub async fn build_synthesis_prompt(store: &GraphStore, node_id: NodeId) -> String {
    let Some(node) = store.get(node_id).await else {
        return String::new();
    };

    let mut parts: Vec<String> = Vec::new();

    parts.push(format!("You are node {node_id}: \"{}\"", node.objective));
    parts.push(String::new());
    parts.push("Your child tasks have completed. Here are their results:".to_string());
    parts.push(String::new());

    for child in store.children(node_id).await {
        if child.status == cord_core::NodeStatus::Complete && !child.result.is_empty() {
            parts.push(format!("--- {} \"{}\" ---", child.id, child.objective));
            parts.push(child.result.clone());
            parts.push(String::new());
        }
    }

    if let Some(prompt) = &node.prompt {
        parts.push("Original instructions:".to_string());
        parts.push(prompt.clone());
        parts.push(String::new());
    }

    parts.push("Synthesize the results from your child tasks into your final output.".to_string());
    parts.push(String::new());
    parts.push("IMPORTANT: When you are done, you MUST call the `complete` tool with your result.".to_string());
    parts.push(String::new());
    parts.push(output_instructions(&node.returns));

    parts.join("\n")
}

fn tool_catalogue_block() -> String {
    [
        "You have MCP tools available for coordination:",
        "- spawn(objective, prompt?, returns?, depends_on?): create an isolated child task.",
        "- fork(objective, prompt?, returns?, depends_on?): create a child that inherits completed siblings' results.",
        "- ask(question, options?, default?): create a human-answered child.",
        "- complete(result?): mark your task done with a result.",
        "- read_tree() / read_node(id): inspect the coordination tree.",
        "- stop(id) / pause(id) / resume(id) / modify(id, ...): manage a descendant task.",
        "",
        "WORKFLOW:",
        "1. Assess whether your task has independent parts.",
        "2. If yes: create children, then call complete().",
        "3. If no: do the work, then call complete().",
        "",
        "depends_on = a child waits for the listed nodes to complete; their results are injected into the child's prompt.",
        "fork children additionally see every completed sibling's result; spawn children see only their own depends_on.",
        "If a child would need results from many nodes, create an intermediate task to synthesize them first.",
        "",
        "IMPORTANT: When you are done, you MUST call the `complete` tool with your result.",
    ]
    .join("\n")
}

fn output_instructions(returns: &str) -> String {
    match returns {
        "text" => "Output your result as plain text.".to_string(),
        "list" => "Output ONLY a JSON array. No markdown formatting, no explanation.".to_string(),
        "structured" => "Output ONLY valid JSON. No markdown formatting, no explanation.".to_string(),
        "file" => "Write your result to a file and output the file path.".to_string(),
        "boolean" => "Output ONLY 'true' or 'false'. No explanation.".to_string(),
        "approval" => "Output ONLY 'approved' or 'rejected'. No explanation.".to_string(),
        other => format!("Output your result (expected type: {other})."),
    }
}
