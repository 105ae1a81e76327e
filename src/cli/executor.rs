//! Command executor for dispatching CLI commands
//!
//! This module provides the main entry point for executing CLI commands
//! after parsing and configuration loading.

use super::handlers::{MigrateCommandHandler, ServeCommandHandler};
use super::parser::{Cli, Commands};
use crate::config::settings::Settings;

/// Execute a CLI command with merged and validated settings
///
/// # Errors
/// Returns errors from the command handlers, including server startup
/// failures for `serve`.
pub async fn execute_command(cli: &Cli, settings: Settings) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Serve { role, dry_run, .. } => {
            ServeCommandHandler::new(settings, *role)
                .execute(*dry_run)
                .await
        }
        Commands::Migrate { dry_run } => {
            MigrateCommandHandler::new(settings)
                .execute(*dry_run)
                .await?;
            Ok(())
        }
    }
}
