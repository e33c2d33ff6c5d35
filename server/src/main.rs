use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use server::app;
use server::cli::{Cli, Command, run_add_user};
use shared::config::load_config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config))?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => app::serve(config).await,
        Command::AddUser(args) => run_add_user(&config, args).await,
    }
}
