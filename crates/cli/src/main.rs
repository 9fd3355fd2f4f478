//! Codepilot CLI — the main entry point.
//!
//! Commands:
//! - `chat`    — Interactive chat or single-message mode
//! - `tools`   — List the built-in tools and their schemas
//! - `config`  — Show the effective configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod console;

#[derive(Parser)]
#[command(
    name = "codepilot",
    about = "Codepilot — a terminal coding assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Read configuration from this file instead of ~/.codepilot/config.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the assistant
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Use the bounded multi-step reasoning driver
        #[arg(long)]
        reasoning: bool,

        /// Inference calls allowed per request in reasoning mode
        #[arg(long)]
        max_steps: Option<u32>,

        /// Override the model name
        #[arg(long)]
        model: Option<String>,
    },

    /// List the built-in tools
    Tools,

    /// Show the effective configuration (API key redacted)
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref())?;

    let filter = if cli.verbose || config.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Chat {
            message,
            reasoning,
            max_steps,
            model,
        } => {
            let options = commands::chat::ChatOptions {
                message,
                reasoning,
                max_steps,
                model,
            };
            commands::chat::run(config, options).await?
        }
        Commands::Tools => commands::tools::run(&config)?,
        Commands::Config => commands::config_cmd::show(&config)?,
    }

    Ok(())
}
