//! Automation workspaces
//!
//! A workspace is any directory holding a `.soulscript/` folder. Every
//! YAML or JSON file directly inside that folder is decoded and its named
//! automations are indexed so they can be run by name.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use soulscript_core_types::{Automation, AutomationFile, DecodeError, FileFormat};
use thiserror::Error;
use tokio::fs;
use tracing::debug;

/// Folder marking a workspace root.
pub const WORKSPACE_DIR: &str = ".soulscript";

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    #[error("automation {name:?} is defined in both {} and {}", first.display(), second.display())]
    DuplicateName {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },
}

/// A named automation and the file it came from.
#[derive(Clone, Debug)]
pub struct NamedAutomation {
    pub automation: Automation,
    pub path: PathBuf,
}

#[derive(Clone, Debug, Default)]
pub struct Workspace {
    root: PathBuf,
    automations: BTreeMap<String, NamedAutomation>,
}

/// Decode one automation file, picking the format from its extension.
pub async fn read_automation_file(path: &Path) -> Result<AutomationFile, WorkspaceError> {
    let format = FileFormat::from_path(path).map_err(|source| WorkspaceError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let contents = fs::read_to_string(path)
        .await
        .map_err(|source| WorkspaceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    AutomationFile::decode(&contents, format).map_err(|source| WorkspaceError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

impl Workspace {
    /// Nearest directory at or above `start` that contains `.soulscript/`.
    pub fn discover(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .find(|dir| dir.join(WORKSPACE_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Load every automation file of the workspace rooted at `root`.
    pub async fn load(root: &Path) -> Result<Self, WorkspaceError> {
        let dir = root.join(WORKSPACE_DIR);
        let mut files = Vec::new();
        let mut entries = fs::read_dir(&dir)
            .await
            .map_err(|source| WorkspaceError::Io {
                path: dir.clone(),
                source,
            })?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|source| WorkspaceError::Io {
                path: dir.clone(),
                source,
            })?
        {
            let path = entry.path();
            if path.is_file() && FileFormat::is_supported(&path) {
                files.push(path);
            }
        }
        files.sort();

        let mut workspace = Workspace {
            root: root.to_path_buf(),
            automations: BTreeMap::new(),
        };
        for path in files {
            let file = read_automation_file(&path).await?;
            debug!(path = %path.display(), automations = file.automations.len(), "Loaded automation file");
            for automation in file.automations {
                workspace.insert(automation, &path)?;
            }
        }
        Ok(workspace)
    }

    /// Discover from `start` and load; `None` when no workspace exists.
    pub async fn open(start: &Path) -> Result<Option<Self>, WorkspaceError> {
        match Self::discover(start) {
            Some(root) => Self::load(&root).await.map(Some),
            None => Ok(None),
        }
    }

    fn insert(&mut self, automation: Automation, path: &Path) -> Result<(), WorkspaceError> {
        // Unnamed automations cannot be addressed and are not indexed.
        let Some(name) = automation.name.clone() else {
            return Ok(());
        };
        if let Some(existing) = self.automations.get(&name) {
            return Err(WorkspaceError::DuplicateName {
                name,
                first: existing.path.clone(),
                second: path.to_path_buf(),
            });
        }
        self.automations.insert(
            name,
            NamedAutomation {
                automation,
                path: path.to_path_buf(),
            },
        );
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get(&self, name: &str) -> Option<&NamedAutomation> {
        self.automations.get(name)
    }

    /// Automation names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.automations.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NamedAutomation)> {
        self.automations
            .iter()
            .map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.automations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.automations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as stdfs;

    fn write(dir: &Path, name: &str, contents: &str) {
        stdfs::write(dir.join(WORKSPACE_DIR).join(name), contents).unwrap();
    }

    fn workspace_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        stdfs::create_dir(dir.path().join(WORKSPACE_DIR)).unwrap();
        dir
    }

    #[test]
    fn discovery_walks_up_to_the_marker() {
        let dir = workspace_dir();
        let nested = dir.path().join("a/b");
        stdfs::create_dir_all(&nested).unwrap();

        assert_eq!(Workspace::discover(&nested), Some(dir.path().to_path_buf()));
    }

    #[tokio::test]
    async fn loads_named_automations_from_yaml_and_json() {
        let dir = workspace_dir();
        write(
            dir.path(),
            "login.yaml",
            "automations:\n  - name: login\n    tasks:\n      - reload\n  - tasks:\n      - stop\n",
        );
        write(
            dir.path(),
            "shots.json",
            r#"{"automations": [{"name": "shoot", "tasks": [{"screenshot": {"name": "a.png"}}]}]}"#,
        );
        write(dir.path(), "notes.txt", "ignored");

        let workspace = Workspace::load(dir.path()).await.unwrap();
        assert_eq!(workspace.names().collect::<Vec<_>>(), vec!["login", "shoot"]);
        assert_eq!(workspace.get("login").unwrap().automation.tasks.len(), 1);
        assert!(workspace
            .get("shoot")
            .unwrap()
            .path
            .ends_with("shots.json"));
    }

    #[tokio::test]
    async fn duplicate_names_fail_to_load() {
        let dir = workspace_dir();
        write(dir.path(), "a.yaml", "automations:\n  - name: same\n    tasks: []\n");
        write(dir.path(), "b.yml", "automations:\n  - name: same\n    tasks: []\n");

        let err = Workspace::load(dir.path()).await.unwrap_err();
        assert!(matches!(err, WorkspaceError::DuplicateName { ref name, .. } if name == "same"));
    }

    #[tokio::test]
    async fn decode_errors_name_the_file() {
        let dir = workspace_dir();
        write(dir.path(), "bad.yaml", "automations:\n  - tasks:\n      - teleport: {}\n");

        let err = Workspace::load(dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("bad.yaml"));
    }

    #[tokio::test]
    async fn open_without_workspace_is_none() {
        let dir = tempfile::tempdir().unwrap();
        // A tempdir may sit below some other workspace; only assert when it does not.
        if Workspace::discover(dir.path()).is_none() {
            assert!(Workspace::open(dir.path()).await.unwrap().is_none());
        }
    }
}
