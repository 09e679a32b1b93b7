//! Per-run accumulator of named outputs and output files

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tokio::fs;
use tracing::{error, info};

/// Named values and files produced by one run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RunResult {
    pub outputs: BTreeMap<String, Value>,
    #[serde(skip)]
    pub output_files: BTreeMap<String, Vec<u8>>,
}

/// Outcome of writing output files to disk.
#[derive(Debug, Default)]
pub struct PersistReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(String, io::Error)>,
}

impl PersistReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

impl RunResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_output(&mut self, name: impl Into<String>, value: Value) {
        self.outputs.insert(name.into(), value);
    }

    pub fn output(&self, name: &str) -> Option<&Value> {
        self.outputs.get(name)
    }

    /// Reserve an (empty) buffer under `name` ahead of a capture.
    pub fn register_file(&mut self, name: impl Into<String>) {
        self.output_files.insert(name.into(), Vec::new());
    }

    pub fn write_file(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.output_files.insert(name.into(), bytes);
    }

    pub fn file(&self, name: &str) -> Option<&[u8]> {
        self.output_files.get(name).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty() && self.output_files.is_empty()
    }

    /// Outputs as JSON indented with four spaces.
    pub fn outputs_json(&self) -> Result<String, serde_json::Error> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.outputs.serialize(&mut serializer)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Write every output file below `dir`, one file per entry.
    ///
    /// A failing file is logged and skipped; the rest are still written.
    pub async fn persist_output_files(&self, dir: &Path) -> PersistReport {
        let mut report = PersistReport::default();
        for (name, bytes) in &self.output_files {
            let path = dir.join(name);
            match write_one(&path, bytes).await {
                Ok(()) => {
                    info!(path = %path.display(), bytes = bytes.len(), "Saved output file");
                    report.written.push(path);
                }
                Err(err) => {
                    error!(file = %name, path = %path.display(), error = %err, "Failed to save output file");
                    report.failed.push((name.clone(), err));
                }
            }
        }
        report
    }
}

async fn write_one(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    fs::write(path, bytes).await
}
