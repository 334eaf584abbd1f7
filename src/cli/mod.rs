//! Command Line Interface module
//!
//! Argument parsing and the command implementations consuming the core.

pub mod args;
pub mod commands;

pub use args::*;

use anyhow::Result;

use crate::config::AppConfig;

/// Main CLI application runner
pub async fn run() -> Result<()> {
    let cli = Cli::parse_args();

    crate::utils::logging::init_logging(cli.verbose, cli.quiet)?;

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_path);
    let config = AppConfig::load(&config_path)?;

    commands::execute_command(cli.command.clone(), &config, &config_path).await
}
