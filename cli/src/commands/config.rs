// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use valuation_core::domain::config::{BlobKind, ServiceConfig, StorageKind};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./valuation-config.yaml)
        #[arg(short, long, default_value = "./valuation-config.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths),
        ConfigCommand::Validate { file } => validate(file.or(config_override)),
        ConfigCommand::Generate { output, examples } => generate(&output, examples),
    }
}

fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = ServiceConfig::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        match &config_override {
            Some(path) => println!("  1. --config flag: {}", path.display()),
            None => println!("  1. --config flag: {}", "(not set)".dimmed()),
        }
        println!(
            "  2. VALUATION_CONFIG_PATH: {}",
            std::env::var("VALUATION_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./valuation-config.yaml");
        println!("  4. ~/.valuation/config.yaml");
        println!("  5. /etc/valuation/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Server:".bold());
    println!("  Listen: {}:{}", config.server.bind_address, config.server.port);
    println!("  Body limit: {} MB", config.server.body_limit_mb);
    println!();

    println!("{}", "Storage:".bold());
    match config.storage.backend {
        StorageKind::InMemory => println!("  Backend: in-memory"),
        StorageKind::Postgres => {
            println!("  Backend: postgres");
            println!("  Max connections: {}", config.storage.max_connections);
        }
    }
    match config.blob.backend {
        BlobKind::InMemory => println!("  Blobs: in-memory"),
        BlobKind::Local => println!(
            "  Blobs: {}",
            config
                .blob
                .root
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(root not set)".to_string())
        ),
    }
    println!("  Blob URL prefix: {}", config.blob.public_base_url);
    println!();

    println!("{}", "Providers:".bold());
    match &config.rc_lookup {
        Some(rc) => println!("  RC lookup: {}", rc.endpoint),
        None => println!("  RC lookup: {}", "(not configured)".dimmed()),
    }
    match &config.valuation_ai {
        Some(ai) => println!("  AI valuation: {} → {}", ai.endpoint, ai.model),
        None => println!("  AI valuation: {}", "(not configured)".dimmed()),
    }
    println!();

    println!("{}", "Observability:".bold());
    println!("  Log level: {} ({})", config.logging.level, config.logging.format);
    if config.metrics.enabled {
        println!("  Metrics: :{}", config.metrics.port);
    } else {
        println!("  Metrics: {}", "disabled".dimmed());
    }

    Ok(())
}

fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config =
        ServiceConfig::load_or_default(config_path).context("Failed to load configuration")?;

    config.validate().context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

fn generate(output: &Path, with_examples: bool) -> Result<()> {
    if with_examples {
        std::fs::write(output, include_str!("../../templates/config-with-examples.yaml"))
            .with_context(|| format!("Failed to write config to {:?}", output))?;
    } else {
        ServiceConfig::default()
            .to_yaml_file(output)
            .with_context(|| format!("Failed to write config to {:?}", output))?;
    }

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generated_configs_parse() {
        let dir = TempDir::new().unwrap();

        let minimal = dir.path().join("minimal.yaml");
        generate(&minimal, false).unwrap();
        let config = ServiceConfig::from_yaml_file(&minimal).unwrap();
        config.validate().unwrap();

        let annotated = dir.path().join("annotated.yaml");
        generate(&annotated, true).unwrap();
        let config = ServiceConfig::from_yaml_file(&annotated).unwrap();
        assert_eq!(config.storage.backend, StorageKind::Postgres);
        assert_eq!(config.valuation_ai.unwrap().model, "gpt-4o-mini");
    }
}
