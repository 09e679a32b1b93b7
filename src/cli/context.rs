use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::sync::OnceCell;

use crate::config::AppConfig;
use crate::workspace::Workspace;

pub struct CliContext {
    config: AppConfig,
    config_path: PathBuf,
    working_dir: PathBuf,
    workspace: OnceCell<Option<Workspace>>,
}

impl CliContext {
    pub fn new(config: AppConfig, config_path: PathBuf, working_dir: PathBuf) -> Self {
        Self {
            config,
            config_path,
            working_dir,
            workspace: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// The workspace enclosing the working directory, loaded on first use.
    pub async fn workspace(&self) -> Result<Option<&Workspace>> {
        let workspace = self
            .workspace
            .get_or_try_init(|| async { Workspace::open(&self.working_dir).await })
            .await?;
        Ok(workspace.as_ref())
    }
}
