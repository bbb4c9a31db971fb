pub mod cli;
pub mod commands;
pub mod config;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use config::{load_config, CliConfig};

/// The main entry point for the command line client.
/// This function handles CLI parsing, configuration and logging, then runs one command.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config_from_cli(&cli)?;
    utxorpc_logger::init(&config.log)?;
    tracing::debug!(uri = %config.node.uri, headers = config.node.headers.len(), "Configuration loaded.");
    commands::execute(cli.command, &config.node).await
}

/// Loads the configuration named by `--config` (if any) and applies the flag overrides.
pub fn load_config_from_cli(cli: &Cli) -> Result<CliConfig> {
    let mut config = load_config(cli.config.as_deref())?;
    config.apply_overrides(cli.uri.as_deref(), &cli.headers);
    Ok(config)
}
