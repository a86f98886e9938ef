//! Threadline - replay conversation event logs through the rendering engine.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::replay::ReplayOptions;
use std::path::PathBuf;
use threadline_tui::EngineConfig;

#[derive(Parser)]
#[command(name = "threadline")]
#[command(author, version, about = "Conversation rendering engine", long_about = None)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON-lines event log and print the rendered buffer
    Replay {
        /// Event log, one inbound event per line
        events: PathBuf,
        /// Session to render (defaults to the first session in the log)
        #[arg(short, long)]
        session: Option<String>,
        /// Render width in columns
        #[arg(long, default_value_t = 80)]
        width: u16,
        /// Viewport height in rows
        #[arg(long, default_value_t = 24)]
        height: u16,
        /// Render tool calls as full blocks
        #[arg(long)]
        details: bool,
        /// Render reasoning
        #[arg(long)]
        thinking: bool,
        /// Print only the visible window instead of the whole buffer
        #[arg(long)]
        visible: bool,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::logging::init_logging(cli.verbose, cli.log_level.as_deref());

    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Replay {
            events,
            session,
            width,
            height,
            details,
            thinking,
            visible,
        } => {
            let options = ReplayOptions {
                events,
                session,
                width,
                height,
                details,
                thinking,
                visible,
            };
            commands::replay::run(options, config).await
        }
        Commands::Config => commands::config::show(&config),
    }
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<EngineConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match EngineConfig::default_path() {
            Some(path) => path,
            None => return Ok(EngineConfig::default()),
        },
    };
    EngineConfig::load(&path).with_context(|| format!("Failed to load config {}", path.display()))
}
