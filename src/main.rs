use alertmail::cli::{Cli, CliHandler};
use anyhow::Result;
use clap::Parser;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set log level based on debug flag
    let log_level = if cli.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(log_level)
        .init();

    if cli.debug {
        tracing::info!("Debug mode enabled - verbose logging active");
    }

    let handler = CliHandler::new(cli.config, cli.timeout.map(Duration::from_secs)).await?;
    handler.handle_command(cli.command, cli.dry_run).await
}
