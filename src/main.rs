mod app;
mod commands;
mod config;
mod conversation;
mod dispatch;
mod events;
mod reply;
mod session;
#[cfg(test)]
mod testing;
mod ui;
mod webhook;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "hookchat")]
#[command(version)]
#[command(about = "Chat with a webhook from your terminal", long_about = None)]
struct Cli {
    /// Webhook endpoint (overrides config file and HOOKCHAT_WEBHOOK_URL)
    #[arg(long, global = true)]
    webhook_url: Option<String>,

    /// Handle one message at a time so replies arrive in order
    #[arg(long, global = true)]
    serialized: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a single message and print the reply
    Send { message: String },
    /// Show the effective configuration
    Config {
        /// Write it to ~/.hookchat/config.toml if no file exists yet
        #[arg(long)]
        init: bool,
    },
}

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hookchat=info"))
}

/// The chat UI owns the terminal, so its logs go to a file
fn init_file_logging(config: &Config) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_path())
        .with_context(|| format!("Failed to open log file {}", config.log_path().display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(default_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(default_filter())
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    config.apply_overrides(cli.webhook_url, cli.serialized);

    match cli.command {
        None => {
            init_file_logging(&config)?;
            app::run(config).await
        }
        Some(Commands::Send { message }) => {
            init_stderr_logging();
            commands::send_once(&config, &message).await
        }
        Some(Commands::Config { init }) => {
            if init {
                commands::init_config(&config)
            } else {
                commands::show_config(&config)
            }
        }
    }
}
