//! Command executor for dispatching CLI commands

use super::handlers::ServeCommandHandler;
use super::parser::Cli;
use crate::config::settings::Settings;

/// Execute the parsed command with merged settings.
///
/// `serve` is the only command, and also what runs when none is given.
pub async fn execute_command(cli: &Cli, settings: Settings) -> anyhow::Result<()> {
    ServeCommandHandler::new(settings)
        .execute(cli.is_dry_run())
        .await
}
