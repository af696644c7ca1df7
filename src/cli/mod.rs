//! CLI definitions for agentdeck.

use std::future::Future;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::stream::ChatTarget;

/// Environment variable holding the log filter for the CLI.
pub const LOG_ENV: &str = "AGENTDECK_LOG";

/// agentdeck CLI
#[derive(Parser, Debug)]
#[command(name = "agentdeck", version, about = "Client for the agentdeck orchestration API")]
pub struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the API base URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stream a chat message to an agent, team, or workflow
    Chat(ChatArgs),
    /// Manage agents
    Agents(CollectionArgs),
    /// Manage teams
    Teams(CollectionArgs),
    /// Manage workflows
    Workflows(CollectionArgs),
    /// Manage tools
    Tools(CollectionArgs),
    /// Inspect executions
    Executions(CollectionArgs),
    /// Show dashboard metrics
    Metrics(MetricsArgs),
    /// Local workflow utilities
    Workflow(WorkflowArgs),
}

/// Arguments for the `chat` subcommand.
#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Agent id (or team/workflow id with --team/--workflow)
    pub target: String,

    /// Message to send
    pub message: String,

    /// Treat the target as a team
    #[arg(long, conflicts_with = "workflow")]
    pub team: bool,

    /// Treat the target as a workflow; the message becomes its input
    #[arg(long)]
    pub workflow: bool,

    /// Continue an existing session
    #[arg(short, long)]
    pub session: Option<String>,

    /// Print the completion summary as JSON to stderr
    #[arg(long)]
    pub summary: bool,
}

impl ChatArgs {
    pub fn chat_target(&self) -> ChatTarget {
        if self.team {
            ChatTarget::Team(self.target.clone())
        } else if self.workflow {
            ChatTarget::Workflow(self.target.clone())
        } else {
            ChatTarget::Agent(self.target.clone())
        }
    }
}

#[derive(Args, Debug)]
pub struct CollectionArgs {
    #[command(subcommand)]
    pub action: CollectionAction,
}

#[derive(Subcommand, Debug)]
pub enum CollectionAction {
    /// List all items
    List,
    /// Show one item
    Get { id: String },
    /// Delete one item
    Delete { id: String },
}

#[derive(Args, Debug)]
pub struct MetricsArgs {
    /// Derive statistics from the execution list instead of `/metrics`
    #[arg(long)]
    pub local: bool,
}

#[derive(Args, Debug)]
pub struct WorkflowArgs {
    #[command(subcommand)]
    pub command: WorkflowCommands,
}

#[derive(Subcommand, Debug)]
pub enum WorkflowCommands {
    /// Validate a saved workflow graph (JSON with `nodes` and `connections`)
    Validate { file: PathBuf },
}

/// Install a stderr subscriber filtered by `AGENTDECK_LOG` (default `warn`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Resolve when `signal` fires. If the handler could not be installed the
/// future never resolves, so the stream runs until its own deadline.
pub async fn interrupted<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::warn!(error = %e, "Ctrl-C handler unavailable");
        std::future::pending::<()>().await;
    }
}
