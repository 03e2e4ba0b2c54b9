//! dubhub command line entry point.

mod bridge;
mod cli;
mod commands;
mod config;
mod render;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use dubhub_api::ApiError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging. Logs go to stderr, output to stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting dubhub");

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let mut cli_config = match config::CliConfig::load_from(&config_path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(error = %e, path = %config_path.display(), "failed to load config, using defaults");
            config::CliConfig::default()
        }
    };
    cli_config.apply_env();
    if let Some(url) = cli.backend_url {
        cli_config.backend_url = url;
    }
    tracing::debug!(backend = %cli_config.backend_url, "configuration loaded");

    let mut ctx = commands::Context::new(cli_config, config_path);
    let result = commands::execute(cli.command, &mut ctx).await;
    if let Err(e) = &result
        && let Some(ApiError::Unauthorized(_)) = e.downcast_ref::<ApiError>()
    {
        eprintln!("hint: the session has expired, run `dubhub login <mobile>` again");
    }
    result
}
