use cord_core::NodeKind;
use cord_prompt::{build_prompt, build_synthesis_prompt};
use cord_store::GraphStore;

#[tokio::test]
async fn leaf_prompt_includes_identity_and_task() {
    let store = GraphStore::open(None::<&str>).unwrap();
    let root = store
        .create_node(
            NodeKind::Goal,
            "ship the feature",
            None,
            Some("be concise".to_string()),
            None,
            Some(cord_core::NodeStatus::Active),
            vec![],
        )
        .await
        .unwrap();

    let prompt = build_prompt(&store, root).await;
    assert!(prompt.contains("You are node #1"));
    assert!(prompt.contains("ship the feature"));
    assert!(prompt.contains("be concise"));
    assert!(prompt.contains("Output your result as plain text."));
    assert!(!prompt.contains("Goal chain:"), "root has no chain to show");
}

#[tokio::test]
async fn dependency_results_are_injected() {
    let store = GraphStore::open(None::<&str>).unwrap();
    let root = store
        .create_node(NodeKind::Goal, "root", None, None, None, Some(cord_core::NodeStatus::Active), vec![])
        .await
        .unwrap();
    let a = store
        .create_node(NodeKind::Spawn, "gather data", Some(root), None, None, None, vec![])
        .await
        .unwrap();
    store.complete(a, "42 rows found").await.unwrap();
    let b = store
        .create_node(NodeKind::Spawn, "analyze", Some(root), None, None, None, vec![a])
        .await
        .unwrap();

    let prompt = build_prompt(&store, b).await;
    assert!(prompt.contains("Results from needed nodes:"));
    assert!(prompt.contains("42 rows found"));
    assert!(prompt.contains("Goal chain:"));
}

#[tokio::test]
async fn fork_children_see_completed_sibling_results_but_spawn_children_do_not() {
    let store = GraphStore::open(None::<&str>).unwrap();
    let root = store
        .create_node(NodeKind::Goal, "root", None, None, None, Some(cord_core::NodeStatus::Active), vec![])
        .await
        .unwrap();
    let s1 = store
        .create_node(NodeKind::Spawn, "sibling one", Some(root), None, None, None, vec![])
        .await
        .unwrap();
    store.complete(s1, "sibling result").await.unwrap();

    let fork_child = store
        .create_node(NodeKind::Fork, "fork child", Some(root), None, None, None, vec![])
        .await
        .unwrap();
    let spawn_child = store
        .create_node(NodeKind::Spawn, "spawn child", Some(root), None, None, None, vec![])
        .await
        .unwrap();

    let fork_prompt = build_prompt(&store, fork_child).await;
    assert!(fork_prompt.contains("Results from sibling tasks:"));
    assert!(fork_prompt.contains("sibling result"));

    let spawn_prompt = build_prompt(&store, spawn_child).await;
    assert!(!spawn_prompt.contains("Results from sibling tasks:"));
}

#[tokio::test]
async fn synthesis_prompt_lists_only_completed_children_with_results() {
    let store = GraphStore::open(None::<&str>).unwrap();
    let root = store
        .create_node(NodeKind::Goal, "root", None, None, None, Some(cord_core::NodeStatus::Active), vec![])
        .await
        .unwrap();
    let a = store
        .create_node(NodeKind::Spawn, "a", Some(root), None, None, None, vec![])
        .await
        .unwrap();
    store.complete(a, "a-result").await.unwrap();
    let b = store
        .create_node(NodeKind::Spawn, "b", Some(root), None, None, None, vec![])
        .await
        .unwrap();
    store.set_status(b, cord_core::NodeStatus::Active).await.unwrap();
    store.set_status(b, cord_core::NodeStatus::Cancelled).await.unwrap();

    let prompt = build_synthesis_prompt(&store, root).await;
    assert!(prompt.contains("a-result"));
    assert!(prompt.contains("Synthesize the results"));
}

#[tokio::test]
async fn missing_node_yields_empty_prompt() {
    let store = GraphStore::open(None::<&str>).unwrap();
    let bogus = cord_core::NodeId::new(42);
    assert_eq!(build_prompt(&store, bogus).await, "");
    assert_eq!(build_synthesis_prompt(&store, bogus).await, "");
}

#[tokio::test]
async fn structured_returns_yield_json_only_instruction() {
    let store = GraphStore::open(None::<&str>).unwrap();
    let root = store
        .create_node(
            NodeKind::Goal,
            "root",
            None,
            None,
            Some("structured".to_string()),
            Some(cord_core::NodeStatus::Active),
            vec![],
        )
        .await
        .unwrap();

    let prompt = build_prompt(&store, root).await;
    assert!(prompt.contains("Output ONLY valid JSON"));
}
