//! agentdeck CLI binary entry point.

use std::io::Write;
use std::path::Path;

use clap::Parser;
use serde::Serialize;

use agentdeck::cli::{
    ChatArgs, Cli, CollectionAction, CollectionArgs, Commands, MetricsArgs, WorkflowCommands,
};
use agentdeck::client::{ApiClient, Resource, ResourceApi};
use agentdeck::config::DeckConfig;
use agentdeck::error::DeckError;
use agentdeck::metrics::ExecutionStats;
use agentdeck::stream::{StreamController, StreamObserver};
use agentdeck::workflow::{ensure_valid, WorkflowGraph};

#[tokio::main]
async fn main() {
    agentdeck::cli::init_tracing();
    let Cli {
        config,
        api_url,
        command,
    } = Cli::parse();

    let result = match command {
        Commands::Workflow(args) => match args.command {
            WorkflowCommands::Validate { file } => handle_validate(&file),
        },
        command => match connect(config.as_deref(), api_url) {
            Ok(client) => dispatch(&client, command).await,
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn connect(config: Option<&Path>, api_url: Option<String>) -> Result<ApiClient, DeckError> {
    let mut config = DeckConfig::load(config)?;
    if let Some(url) = api_url {
        config.base_url = url;
    }
    ApiClient::new(config)
}

async fn dispatch(client: &ApiClient, command: Commands) -> Result<(), DeckError> {
    match command {
        Commands::Chat(args) => handle_chat(client, args).await,
        Commands::Agents(args) => handle_collection(client.agents(), args).await,
        Commands::Teams(args) => handle_collection(client.teams(), args).await,
        Commands::Workflows(args) => handle_collection(client.workflows(), args).await,
        Commands::Tools(args) => handle_collection(client.tools(), args).await,
        Commands::Executions(args) => handle_collection(client.executions(), args).await,
        Commands::Metrics(args) => handle_metrics(client, args).await,
        Commands::Workflow(args) => match args.command {
            WorkflowCommands::Validate { file } => handle_validate(&file),
        },
    }
}

struct Printer;

impl StreamObserver for Printer {
    fn on_chunk(&mut self, content: &str) {
        print!("{content}");
        let _ = std::io::stdout().flush();
    }
}

async fn handle_chat(client: &ApiClient, args: ChatArgs) -> Result<(), DeckError> {
    let mut session = client.chat_session(args.chat_target());
    if let Some(ref id) = args.session {
        session = session.with_session_id(id.clone());
    }

    let controller = StreamController::new(client.transport(), session.request(&args.message));
    let ctrl_c = agentdeck::cli::interrupted(tokio::signal::ctrl_c());
    let outcome = controller.run_until(&mut Printer, ctrl_c).await;
    println!(); // newline after streaming

    let summary = outcome.into_result()?;
    if args.summary {
        eprintln!("{}", serde_json::to_string_pretty(&summary.to_json())?);
    } else if let Some(id) = summary.session_id {
        eprintln!("session: {id}");
    }
    Ok(())
}

async fn handle_collection<R>(api: ResourceApi<'_, R>, args: CollectionArgs) -> Result<(), DeckError>
where
    R: Resource + Serialize,
{
    match args.action {
        CollectionAction::List => print_json(&api.list().await?),
        CollectionAction::Get { id } => print_json(&api.get(&id).await?),
        CollectionAction::Delete { id } => {
            api.delete(&id).await?;
            eprintln!("deleted {}/{id}", R::COLLECTION);
            Ok(())
        }
    }
}

async fn handle_metrics(client: &ApiClient, args: MetricsArgs) -> Result<(), DeckError> {
    if args.local {
        let executions = client.executions().list().await?;
        print_json(&ExecutionStats::from_executions(&executions))
    } else {
        print_json(&client.metrics().await?)
    }
}

fn handle_validate(file: &Path) -> Result<(), DeckError> {
    let raw = std::fs::read_to_string(file)?;
    let graph: WorkflowGraph = serde_json::from_str(&raw)?;
    ensure_valid(&graph)?;
    println!(
        "{}: {} nodes, {} connections, valid",
        file.display(),
        graph.len(),
        graph.connections().len()
    );
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), DeckError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
