// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `valuation serve`

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use valuation_core::domain::config::ServiceConfig;

use crate::server;

#[derive(Args)]
pub struct ServeCommand {
    /// Override `server.port`
    #[arg(long, env = "VALUATION_PORT")]
    port: Option<u16>,

    /// Override `server.bind_address`
    #[arg(long, env = "VALUATION_HOST")]
    host: Option<String>,
}

pub async fn execute(cmd: ServeCommand, config_path: Option<PathBuf>) -> Result<()> {
    let mut config =
        ServiceConfig::load_or_default(config_path).context("Failed to load configuration")?;

    if let Some(port) = cmd.port {
        config.server.port = port;
    }
    if let Some(host) = cmd.host {
        config.server.bind_address = host;
    }

    config.validate().context("Configuration validation failed")?;

    server::run(config).await
}
