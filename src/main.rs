use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use quickrag_chat::app::App;
use quickrag_chat::tui::{self, EventHandler, Tui};
use quickrag_chat::{handler, logging, ui};
use quickrag_chat::{Config, QueryClient, Transcript};

#[derive(Parser)]
#[command(name = "quickrag", version)]
#[command(about = "Chat with a Quick-RAG server from the terminal")]
struct Cli {
    /// Base URL of the Quick-RAG server
    #[arg(long, env = "QUICKRAG_URL")]
    url: Option<String>,
    /// Only answer from this document id (repeatable)
    #[arg(long = "doc", value_name = "ID")]
    doc_ids: Vec<i64>,
    /// Read this config file instead of the default one
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask one question and print the answer with its sources
    Ask {
        /// Your question
        question: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let _log_guard = logging::try_init(Config::app_dir());

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    }
    .merge(cli.url, cli.doc_ids);

    let client = QueryClient::new(config.base_url()).with_doc_ids(config.doc_ids.clone());
    tracing::info!(endpoint = %client.endpoint(), doc_ids = ?config.doc_ids, "starting");

    match cli.command {
        Some(Commands::Ask { question }) => Ok(ask(&client, &question).await),
        None => {
            run_tui(client).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn ask(client: &QueryClient, question: &str) -> ExitCode {
    let outcome = quickrag_chat::ask::ask(client, question).await;
    if !outcome.output.is_empty() {
        println!("{}", outcome.output);
    }

    if outcome.failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

async fn run_tui(client: QueryClient) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut events = EventHandler::new();
    let mut app = App::new(client, Transcript::with_greeting(), events.sender());

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    if app.is_waiting() {
        tracing::info!(pending = app.transcript.pending_count(), "quitting with queries in flight");
    }
    result
}

async fn run_loop(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }
    }
    Ok(())
}
