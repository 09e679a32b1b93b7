use std::env;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use super::context::CliContext;
use super::dispatch::dispatch;
use super::env::CliArgs;
use super::runtime::{init_logging, load_config, LoadedConfig};

pub async fn run() -> Result<()> {
    let cli = CliArgs::parse();

    init_logging(&cli.log_level, cli.debug)?;

    if let Some(dir) = &cli.chdir {
        env::set_current_dir(dir)
            .with_context(|| format!("Failed to change directory to {}", dir.display()))?;
    }

    info!("Starting SoulScript v{}", env!("CARGO_PKG_VERSION"));

    let LoadedConfig { config, path } = load_config(cli.config.as_ref()).await?;
    let working_dir = env::current_dir().context("Failed to resolve working directory")?;
    let cli_context = CliContext::new(config, path, working_dir);

    match dispatch(&cli, &cli_context).await {
        Ok(()) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(err) => {
            error!("Command failed: {:#}", err);
            Err(err)
        }
    }
}
