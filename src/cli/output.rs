use std::io::{self, Write};
use std::path::Path;

use action_flow::RunResult;
use anyhow::{Context, Result};
use tracing::warn;

/// Print the run outputs as four-space indented JSON on stdout.
pub fn print_outputs(result: &RunResult) -> Result<()> {
    let json = result
        .outputs_json()
        .context("Failed to serialize outputs")?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{json}").context("Failed to write outputs")?;
    stdout.flush().context("Failed to write outputs")
}

/// Write output files into `dir`; failures are logged and skipped.
pub async fn persist_files(result: &RunResult, dir: &Path) {
    if result.output_files.is_empty() {
        return;
    }
    let report = result.persist_output_files(dir).await;
    if !report.is_complete() {
        warn!(
            written = report.written.len(),
            failed = report.failed.len(),
            dir = %dir.display(),
            "Some output files could not be saved"
        );
    }
}
