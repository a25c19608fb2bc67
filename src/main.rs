//! `cord` — run a natural-language goal through the coordination kernel, or serve the tool
//! protocol for one already-launched agent.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cord_engine::{Engine, EngineConfig};

#[derive(Parser)]
#[command(
    name = "cord",
    about = "Recursively decomposes a goal into a tree of agent subtasks and runs them to completion",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory staging files (tool-server config, prompts, the debug snapshot) are written under
    #[arg(long, global = true, default_value = ".")]
    project_dir: PathBuf,

    /// Write logs to this file in addition to stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a goal end-to-end
    Run {
        /// Inline goal text, or a path to a UTF-8 file whose contents are the goal
        goal: String,

        /// Budget in USD passed to the runtime adapter, if it supports one
        #[arg(long, default_value_t = 2.0)]
        budget: f64,

        /// Model tag passed to the runtime adapter; defaults to the adapter's own default
        #[arg(long)]
        model: Option<String>,

        /// Runtime adapter to launch agents with
        #[arg(long, default_value = "codex-app-server")]
        runtime: String,

        /// Seconds between scheduler ticks
        #[arg(long, default_value_t = 2)]
        poll_interval_secs: u64,
    },

    /// Serve the tool protocol for one running agent, proxied over CORD_TOOLS_SOCK
    ToolServer {
        /// The node id this process is acting as
        #[arg(long)]
        agent_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_deref());

    match cli.command {
        Commands::Run {
            goal,
            budget,
            model,
            runtime,
            poll_interval_secs,
        } => {
            let goal_text = read_goal(&goal)?;
            let config = EngineConfig {
                project_dir: cli.project_dir,
                runtime,
                model,
                max_budget_usd: budget,
                poll_interval: Duration::from_secs(poll_interval_secs),
            };
            let mut engine = Engine::new(config)?;
            if let Err(e) = engine.run(&goal_text).await {
                eprintln!("cord: {e}");
                std::process::exit(1);
            }
            Ok(())
        }

        Commands::ToolServer { agent_id } => {
            // The agent id is already known to the caller (it is how the launch plan named
            // this process); the handshake still carries it so the engine's accept loop
            // doesn't need a side channel to learn which connection belongs to which agent.
            run_tool_proxy(&agent_id).await
        }
    }
}

fn init_tracing(log_file: Option<&std::path::Path>) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cord=info".into());

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .expect("failed to open --log-file");
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .with(tracing_subscriber::fmt::layer().with_writer(std::sync::Mutex::new(file)).with_ansi(false))
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

/// Resolve `goal` as either a readable file path (stripped of surrounding whitespace) or the
/// literal inline text.
fn read_goal(goal: &str) -> anyhow::Result<String> {
    let path = std::path::Path::new(goal);
    if path.is_file() {
        Ok(std::fs::read_to_string(path)?.trim().to_string())
    } else {
        Ok(goal.to_string())
    }
}

/// Connect to the engine's Unix socket, announce which agent this process is acting as, and
/// then proxy this process's own stdio over the connection verbatim — the engine-side
/// `ToolServer` speaks the same framed JSON protocol on the other end.
async fn run_tool_proxy(agent_id: &str) -> anyhow::Result<()> {
    use tokio::io::{AsyncWriteExt, copy};
    use tokio::net::UnixStream;

    let sock_path = std::env::var("CORD_TOOLS_SOCK")
        .map_err(|_| anyhow::anyhow!("CORD_TOOLS_SOCK is not set; this binary is meant to be launched by cord itself"))?;
    let mut stream = UnixStream::connect(&sock_path).await?;
    stream
        .write_all(format!("{{\"agent_id\": \"{agent_id}\"}}\n").as_bytes())
        .await?;

    let (mut read_half, mut write_half) = stream.into_split();
    let stdin_to_socket = tokio::spawn(async move {
        let mut stdin = tokio::io::stdin();
        let _ = copy(&mut stdin, &mut write_half).await;
        let _ = write_half.shutdown().await;
    });
    let socket_to_stdout = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        let _ = copy(&mut read_half, &mut stdout).await;
    });

    let _ = tokio::join!(stdin_to_socket, socket_to_stdout);
    Ok(())
}
