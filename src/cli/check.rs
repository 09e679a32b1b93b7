use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use soulscript_core_types::FileFormat;
use tokio::fs;
use tracing::{debug, error};

use crate::workspace::read_automation_file;

#[derive(Args, Clone, Debug)]
pub struct CheckArgs {
    /// Automation files (or directories with --recursive)
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Check YAML and JSON files in directories recursively
    #[arg(short, long)]
    pub recursive: bool,
}

pub async fn cmd_check(args: CheckArgs) -> Result<()> {
    let files = enumerate_files(&args.files, args.recursive).await?;

    let mut failures = 0usize;
    for path in &files {
        match read_automation_file(path).await {
            Ok(file) => {
                debug!(path = %path.display(), automations = file.automations.len(), "File decoded");
                println!("{}: ok", path.display());
            }
            Err(err) => {
                error!(path = %path.display(), "Check failed");
                eprintln!("{err}");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} file(s) contained errors", files.len());
    }
    Ok(())
}

async fn enumerate_files(inputs: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        let metadata = fs::metadata(input)
            .await
            .with_context(|| format!("unable to check {}", input.display()))?;
        if !metadata.is_dir() {
            files.push(input.clone());
            continue;
        }
        if !recursive {
            bail!("{} is a directory (use --recursive)", input.display());
        }

        let mut pending = vec![input.clone()];
        let mut found = Vec::new();
        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir)
                .await
                .with_context(|| format!("unable to read {}", dir.display()))?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                } else if FileFormat::is_supported(&path) {
                    found.push(path);
                }
            }
        }
        found.sort();
        files.extend(found);
    }
    Ok(files)
}
