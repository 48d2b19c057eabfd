//! Dispatches a parsed command to its handler.

use super::handlers::{CreateAdminCommandHandler, MigrateCommandHandler, ServeCommandHandler};
use super::parser::{Cli, Commands};
use crate::config::{Environment, Settings};

/// Runs the selected subcommand; no subcommand means `serve`.
pub async fn execute_command(
    cli: &Cli,
    settings: Settings,
    environment: Environment,
) -> anyhow::Result<()> {
    warn_about_arguments(cli);

    match &cli.command {
        Some(Commands::Serve { dry_run, .. }) => {
            ServeCommandHandler::new(settings, environment)
                .execute(*dry_run)
                .await
        }
        None => ServeCommandHandler::new(settings, environment).execute(false).await,
        Some(Commands::Migrate { dry_run, rollback }) => {
            MigrateCommandHandler::new(settings)
                .execute(*dry_run, *rollback)
                .await?;
            Ok(())
        }
        Some(Commands::CreateAdmin {
            username,
            email,
            password,
        }) => {
            CreateAdminCommandHandler::new(settings)
                .execute(username, email, password)
                .await?;
            Ok(())
        }
    }
}

/// Legal but risky combinations are reported, not rejected.
fn warn_about_arguments(cli: &Cli) {
    for warning in argument_warnings(cli) {
        tracing::warn!("{}", warning);
    }
}

fn argument_warnings(cli: &Cli) -> Vec<String> {
    let mut warnings = Vec::new();
    match &cli.command {
        Some(Commands::Serve {
            port: Some(port), ..
        }) if *port < 1024 => {
            warnings.push(format!(
                "Binding to port {} typically requires root privileges",
                port
            ));
        }
        Some(Commands::Migrate {
            rollback: Some(steps),
            ..
        }) if *steps > 10 => {
            warnings.push(format!(
                "Rolling back {} migrations drops most of the schema",
                steps
            ));
        }
        _ => {}
    }
    warnings
}
