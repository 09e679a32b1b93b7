use clap::Subcommand;

use super::check::CheckArgs;
use super::devices::DevicesArgs;
use super::list::ListArgs;
use super::run::RunArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Run automation files, URLs and step expressions in one browser session
    Run(RunArgs),

    /// Decode automation files and report errors
    Check(CheckArgs),

    /// List device emulation ids
    Devices(DevicesArgs),

    /// List the named automations of the current workspace
    List(ListArgs),
}
