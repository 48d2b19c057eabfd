//! Command-line entry point.
//!
//! - Argument parsing with clap
//! - Configuration merging (CLI args over config files and env vars)
//! - Command handlers for serve, migrate and create-admin

pub mod config_merger;
pub mod executor;
pub mod handlers;
pub mod parser;
pub mod validation;

pub use config_merger::ConfigurationMerger;
pub use executor::execute_command;
pub use parser::{Cli, Commands, Environment, LogLevel};

use anyhow::Context;
use clap::Parser;

use crate::config::Settings;
use crate::logger::init_logger;

/// Parses arguments, loads settings, installs the logger and runs the command.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let merger = ConfigurationMerger::load(&cli).context("Failed to load configuration")?;
    let settings = merger
        .merge_cli_args(&cli)
        .context("Invalid configuration")?;
    init_logger_from_settings(&settings)?;

    execute_command(&cli, settings, merger.environment()).await
}

pub fn init_logger_from_settings(settings: &Settings) -> anyhow::Result<()> {
    let logger_config = settings
        .logger
        .clone()
        .into_logger_config()
        .context("Invalid logger configuration")?;
    init_logger(logger_config).context("Failed to initialize logger")?;
    Ok(())
}
