use account_sync::cli::{Cli, execute_command, load_and_merge_config};
use account_sync::logger::init_logger;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = load_and_merge_config(&cli)?;
    init_logger(&settings.logger)?;

    if let Err(e) = execute_command(&cli, settings).await {
        tracing::error!(error = %e, "Command failed");
        return Err(e);
    }

    Ok(())
}
