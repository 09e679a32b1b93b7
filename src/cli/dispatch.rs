use super::check::cmd_check;
use super::devices::cmd_devices;
use super::env::CliArgs;
use super::list::cmd_list;
use super::run::cmd_run;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;
use anyhow::Result;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Run(args) => cmd_run(args, ctx).await,
        Commands::Check(args) => cmd_check(args).await,
        Commands::Devices(args) => cmd_devices(args),
        Commands::List(args) => cmd_list(args, ctx).await,
    }
}
