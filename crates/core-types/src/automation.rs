//! Automation files: named, ordered task lists.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::task::Task;

/// An ordered list of tasks, optionally named so it can be run by name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Automation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Automation {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { name: None, tasks }
    }
}

/// Source encodings accepted for automation files.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FileFormat {
    Yaml,
    Json,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Result<Self, DecodeError> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "yaml" | "yml" => Ok(FileFormat::Yaml),
            "json" => Ok(FileFormat::Json),
            _ => Err(DecodeError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn is_supported(path: &Path) -> bool {
        Self::from_path(path).is_ok()
    }
}

/// Top-level document of an automation file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AutomationFile {
    #[serde(default)]
    pub automations: Vec<Automation>,
}

impl AutomationFile {
    pub fn decode(contents: &str, format: FileFormat) -> Result<Self, DecodeError> {
        match format {
            FileFormat::Yaml => Ok(serde_yaml::from_str(contents)?),
            FileFormat::Json => Ok(serde_json::from_str(contents)?),
        }
    }

    pub fn find(&self, name: &str) -> Option<&Automation> {
        self.automations
            .iter()
            .find(|automation| automation.name.as_deref() == Some(name))
    }

    /// All tasks of every automation, in file order.
    pub fn flatten(self) -> Vec<Task> {
        self.automations
            .into_iter()
            .flat_map(|automation| automation.tasks)
            .collect()
    }
}
