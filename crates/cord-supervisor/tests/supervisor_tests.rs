use cord_core::NodeId;
use cord_supervisor::ProcessSupervisor;
use std::process::Stdio;
use tokio::process::Command;

fn spawn_echo(text: &str) -> tokio::process::Child {
    Command::new("sh")
        .arg("-c")
        .arg(format!("echo {text}"))
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .expect("spawn sh")
}

fn spawn_sleep(secs: u64) -> tokio::process::Child {
    Command::new("sh")
        .arg("-c")
        .arg(format!("sleep {secs}"))
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .expect("spawn sh")
}

#[tokio::test]
async fn poll_exits_drains_finished_children_and_leaves_running_ones() {
    let mut sup = ProcessSupervisor::new();
    let done = NodeId::new(1);
    let running = NodeId::new(2);

    sup.register(done, spawn_echo("hello"));
    sup.register(running, spawn_sleep(30));

    // give the fast child time to actually exit.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let exits = sup.poll_exits().await;
    assert_eq!(exits.len(), 1);
    assert_eq!(exits[0].id, done);
    assert_eq!(exits[0].exit_code, Some(0));
    assert!(exits[0].stdout.contains("hello"));

    assert_eq!(sup.active_count(), 1);
    assert!(sup.is_active(running));

    sup.cancel(running).await;
}

#[tokio::test]
async fn cancel_unknown_node_returns_false() {
    let mut sup = ProcessSupervisor::new();
    assert!(!sup.cancel(NodeId::new(99)).await);
}

#[tokio::test]
async fn cancel_all_stops_every_tracked_child() {
    let mut sup = ProcessSupervisor::new();
    sup.register(NodeId::new(1), spawn_sleep(30));
    sup.register(NodeId::new(2), spawn_sleep(30));
    assert_eq!(sup.active_count(), 2);

    sup.cancel_all().await;

    // give the kill signal time to land, then poll should observe both as exited (or
    // at least no longer hang the test).
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    let exits = sup.poll_exits().await;
    assert!(exits.len() <= 2);
}
