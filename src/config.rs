//! Application configuration
//!
//! Loaded from YAML; every field is optional and command-line flags take
//! precedence over what is configured here.

use std::path::PathBuf;
use std::time::Duration;

use cdp_adapter::config::CdpConfig;
use serde::{Deserialize, Serialize};

/// Top-level `config.yaml` document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Remote browser endpoint to attach to instead of launching Chrome.
    pub browser_url: Option<String>,
    /// Device emulation id applied to every run.
    pub device: Option<String>,
    /// Where output files are written.
    pub output_dir: Option<PathBuf>,
    /// Overrides `SOULSCRIPT_HEADLESS` for launched browsers.
    pub headless: Option<bool>,
    /// Chrome binary; detected when unset.
    pub chrome_path: Option<PathBuf>,
    pub user_data_dir: Option<PathBuf>,
    #[serde(
        with = "soulscript_core_types::duration::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub request_timeout: Option<Duration>,
}

impl AppConfig {
    /// Browser settings with the configured values applied over detection
    /// defaults.
    pub fn cdp_config(&self) -> CdpConfig {
        let mut config = CdpConfig::default();
        if let Some(path) = &self.chrome_path {
            config.executable = Some(path.clone());
        }
        if let Some(dir) = &self.user_data_dir {
            config.user_data_dir = Some(dir.clone());
        }
        if let Some(headless) = self.headless {
            config.headless = headless;
        }
        if let Some(timeout) = self.request_timeout {
            config.request_timeout = timeout;
        }
        config
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
