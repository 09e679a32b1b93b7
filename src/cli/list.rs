use anyhow::{Context, Result};
use clap::Args;

use super::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct ListArgs {
    /// Show the defining file and task count
    #[arg(short, long)]
    pub long: bool,
}

pub async fn cmd_list(args: ListArgs, ctx: &CliContext) -> Result<()> {
    let workspace = ctx.workspace().await?.with_context(|| {
        format!(
            "no .soulscript workspace found from {}",
            ctx.working_dir().display()
        )
    })?;

    for (name, entry) in workspace.iter() {
        if args.long {
            let path = entry
                .path
                .strip_prefix(workspace.root())
                .unwrap_or(&entry.path);
            println!(
                "{:<24} {:>3} task(s)  {}",
                name,
                entry.automation.tasks.len(),
                path.display()
            );
        } else {
            println!("{name}");
        }
    }
    Ok(())
}
