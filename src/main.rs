//! Bird ID Assistant
//!
//! A conversational assistant that can consult a vector store of
//! bird-species articles before answering.
//!
//! Usage:
//!   bird-id-assistant run                 Start a conversation
//!   bird-id-assistant query "robin" -n 3  Query the document store directly

mod config;
mod history;
mod llm;
mod retrieval;
mod session;
#[cfg(test)]
mod testing;
mod tools;
mod turn;

use clap::{Parser, Subcommand};
use config::{AssistantConfig, Overrides};
use llm::{LlmService, LoggingService, OllamaService};
use retrieval::{ChromaClient, DocumentSearch};
use session::Session;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};
use turn::TurnController;

/// Characters of each passage shown by `query`
const PREVIEW_CHARS: usize = 100;

/// Bird ID Assistant - chat about bird species with optional document lookup
#[derive(Parser)]
#[command(name = "bird-id-assistant", version, about, long_about = None)]
struct Cli {
    /// Vector store host
    #[arg(long, global = true)]
    host: Option<String>,

    /// Vector store port
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Vector store collection name
    #[arg(long, global = true)]
    collection: Option<String>,

    /// Ollama server URL
    #[arg(long, global = true)]
    ollama_host: Option<String>,

    /// Chat model tag
    #[arg(long, global = true)]
    model: Option<String>,

    /// Embedding model tag; must match the one the collection was built with
    #[arg(long, global = true)]
    embed_model: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a conversation with the assistant
    Run,

    /// Query documents from the vector store
    Query {
        /// Query string
        query: String,
        /// Number of closest matching documents to retrieve
        #[arg(
            short = 'n',
            long = "n_results",
            default_value_t = 1,
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        n_results: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the conversation
    let fmt_layer = if cli.log_json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(false)
            .with_span_list(false)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bird_id_assistant=info".into()),
        )
        .with(fmt_layer)
        .init();

    let config = AssistantConfig::from_env().with_overrides(Overrides {
        ollama_host: cli.ollama_host,
        model: cli.model,
        embed_model: cli.embed_model,
        host: cli.host,
        port: cli.port,
        collection: cli.collection,
    });

    // The collection is resolved on first search, so `run` starts even
    // when the store is down
    let search = ChromaClient::new(&config.retrieval)?;

    match cli.command {
        Commands::Run => {
            let ollama: Arc<dyn LlmService> = Arc::new(OllamaService::new(&config.llm)?);
            let llm = Arc::new(LoggingService::new(ollama));
            let controller = TurnController::new(llm, Arc::new(search));

            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            Session::new(controller)
                .run(stdin, tokio::io::stdout())
                .await?;
        }
        Commands::Query { query, n_results } => {
            let limit = usize::try_from(n_results)?;
            for passage in search.search(&query, limit).await? {
                let preview: String = passage.chars().take(PREVIEW_CHARS).collect();
                println!("{preview}");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("bird-id-assistant").chain(args.iter().copied()))
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_query_count_defaults_to_one() {
        let cli = parse(&["query", "robin"]).unwrap();
        assert!(matches!(cli.command, Commands::Query { n_results: 1, .. }));

        let cli = parse(&["query", "robin", "-n", "3", "--embed-model", "all-minilm"]).unwrap();
        assert!(matches!(cli.command, Commands::Query { n_results: 3, .. }));
        assert_eq!(cli.embed_model.as_deref(), Some("all-minilm"));
    }

    #[test]
    fn test_query_count_rejects_zero() {
        let err = parse(&["query", "robin", "-n", "0"]).err().unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        assert!(parse(&["query", "robin", "--n_results", "-2"]).is_err());
    }
}
