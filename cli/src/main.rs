// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Valuation Service CLI
//!
//! The `valuation` binary hosts the vehicle valuation HTTP API.
//!
//! ## Commands
//!
//! - `valuation serve` - Run the HTTP API
//! - `valuation config show|validate|generate` - Configuration management
//! - `valuation migrate` - Apply PostgreSQL schema migrations

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use valuation_core::domain::config::ServiceConfig;

mod commands;
mod server;

use commands::{ConfigCommand, MigrateCommand, ServeCommand};

/// Vehicle valuation case service
#[derive(Parser)]
#[command(name = "valuation")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "VALUATION_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); defaults to `logging.level`
    #[arg(long, global = true, env = "VALUATION_LOG_LEVEL")]
    log_level: Option<String>,

    /// Emit logs as JSON lines regardless of `logging.format`
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    #[command(name = "serve")]
    Serve {
        #[command(flatten)]
        command: ServeCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Apply database migrations
    #[command(name = "migrate")]
    Migrate {
        #[command(flatten)]
        command: MigrateCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Logging settings come from the config file when present; the command
    // itself reloads and reports config errors.
    let logging = ServiceConfig::load_or_default(cli.config.clone())
        .map(|c| c.logging)
        .unwrap_or_default();
    let level = cli.log_level.as_deref().unwrap_or(&logging.level);
    init_logging(level, cli.json_logs || logging.format == "json")?;

    match cli.command {
        Commands::Serve { command } => commands::serve::execute(command, cli.config).await,
        Commands::Config { command } => commands::config::handle_command(command, cli.config).await,
        Commands::Migrate { command } => commands::migrate::execute(command, cli.config).await,
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }

    Ok(())
}
