//! Medbot CLI
//!
//! Main entry point for the medbot command-line tool.
//! Serves the Medical Chatbot API, answers questions directly, or runs
//! indexing on its own.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, IngestCommand, ServeCommand};
use medbot_core::config::{AppConfig, ConfigOverrides};
use medbot_core::{logging, AppResult};
use std::path::PathBuf;

/// Medbot - medical question answering over a PDF library
#[derive(Parser, Debug)]
#[command(name = "medbot")]
#[command(about = "Medical question answering over a PDF library", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "MEDBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Directory containing the PDF documents
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Vector index name
    #[arg(long, global = true)]
    index_name: Option<String>,

    /// Use an in-memory vector index instead of Pinecone
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API (default)
    Serve(ServeCommand),

    /// Answer questions and print them
    Ask(AskCommand),

    /// Index the PDF directory and exit
    Ingest(IngestCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Commands::Serve(ServeCommand::default()));

    let (host, port) = match &command {
        Commands::Serve(cmd) => (cmd.host.clone(), cmd.port),
        _ => (None, None),
    };

    // Load base configuration, then apply CLI overrides
    let config = AppConfig::load(cli.config.as_deref())?.with_overrides(ConfigOverrides {
        host,
        port,
        data_dir: cli.data_dir,
        index_name: cli.index_name,
        log_level: cli.log_level,
        verbose: cli.verbose,
        no_color: cli.no_color,
        log_json: cli.log_json,
        offline: cli.offline,
    });

    // Initialize logging with final configuration
    logging::init_logging(
        config.logging.level.as_deref(),
        !config.logging.color,
        config.logging.json,
    )?;

    tracing::info!("Medbot starting");
    tracing::debug!("Config file: {:?}", config.config_file);
    tracing::debug!("Data directory: {:?}", config.data_dir);
    tracing::debug!("Index: {}", config.index.name);
    tracing::debug!("Chat model: {} ({})", config.chat.model, config.chat.provider);

    config.validate()?;

    let command_name = match &command {
        Commands::Serve(_) => "serve",
        Commands::Ask(_) => "ask",
        Commands::Ingest(_) => "ingest",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match command {
        Commands::Serve(cmd) => cmd.execute(config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Ingest(cmd) => cmd.execute(&config).await,
    };

    // Log completion
    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
