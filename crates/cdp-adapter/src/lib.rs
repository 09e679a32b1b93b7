//! Browser backend for soulscript.
//!
//! The execution engine only talks to the [`Session`] trait. This crate
//! provides that interface together with a concrete implementation driving
//! Chromium over the DevTools protocol through `chromiumoxide`.

use std::{env, path::PathBuf};

use which::which;

pub mod adapter;
pub mod commands;
pub mod devices;
pub mod scripts;
pub mod session;

pub use adapter::ChromiumSession;
pub use commands::{BrowserVersion, ElementRect, QueryAction, QueryProbe, QuerySpec};
pub use devices::DeviceProfile;
pub use error::{AdapterError, AdapterErrorKind};
pub use session::Session;

pub mod error {
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use thiserror::Error;

    /// High-level error categories surfaced by the adapter.
    #[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
    pub enum AdapterErrorKind {
        #[error("navigation failed")]
        Navigation,
        #[error("cdp i/o failure")]
        CdpIo,
        #[error("target element not found")]
        TargetNotFound,
        #[error("script evaluation failed")]
        ScriptFailed,
        #[error("browser launch failed")]
        LaunchFailed,
        #[error("internal error")]
        Internal,
    }

    /// Enriched error metadata passed back to higher layers.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct AdapterError {
        pub kind: AdapterErrorKind,
        pub hint: Option<String>,
        pub retriable: bool,
        pub data: Option<serde_json::Value>,
    }

    impl fmt::Display for AdapterError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.kind)?;
            if let Some(hint) = &self.hint {
                write!(f, ": {}", hint)?;
            }
            Ok(())
        }
    }

    impl std::error::Error for AdapterError {}

    impl AdapterError {
        pub fn new(kind: AdapterErrorKind) -> Self {
            Self {
                kind,
                hint: None,
                retriable: false,
                data: None,
            }
        }

        pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
            self.hint = Some(hint.into());
            self
        }

        pub fn retriable(mut self, flag: bool) -> Self {
            self.retriable = flag;
            self
        }

        pub fn with_data(mut self, data: serde_json::Value) -> Self {
            self.data = Some(data);
            self
        }
    }

    impl From<chromiumoxide::error::CdpError> for AdapterError {
        fn from(err: chromiumoxide::error::CdpError) -> Self {
            AdapterError::new(AdapterErrorKind::CdpIo).with_hint(err.to_string())
        }
    }
}

pub mod config {
    use crate::detect_chrome_executable;
    use serde::{Deserialize, Serialize};
    use std::{env, path::PathBuf, time::Duration};

    /// Configuration for launching or attaching to a browser.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct CdpConfig {
        pub executable: Option<PathBuf>,
        /// Profile directory for launched browsers; chromiumoxide picks a
        /// temporary one when unset.
        pub user_data_dir: Option<PathBuf>,
        pub headless: bool,
        pub request_timeout: Duration,
        pub launch_timeout: Duration,
        /// Poll interval for element queries that do not set their own.
        pub default_retry_interval: Duration,
        pub extra_args: Vec<String>,
    }

    impl Default for CdpConfig {
        fn default() -> Self {
            Self {
                executable: detect_chrome_executable(),
                user_data_dir: env::var("SOULSCRIPT_CHROME_PROFILE").ok().map(PathBuf::from),
                headless: resolve_headless_default(),
                request_timeout: Duration::from_secs(30),
                launch_timeout: Duration::from_secs(20),
                default_retry_interval: Duration::from_millis(100),
                extra_args: Vec::new(),
            }
        }
    }

    fn resolve_headless_default() -> bool {
        // "0", "false", "no", "off" means headful
        match env::var("SOULSCRIPT_HEADLESS") {
            Ok(value) => {
                let lower = value.to_ascii_lowercase();
                !matches!(lower.as_str(), "0" | "false" | "no" | "off")
            }
            Err(_) => true,
        }
    }
}

fn detect_chrome_executable() -> Option<PathBuf> {
    if let Ok(raw) = env::var("SOULSCRIPT_CHROME") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            let candidate = PathBuf::from(trimmed);
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    for name in chrome_executable_names() {
        if let Ok(path) = which(name) {
            return Some(path);
        }
    }

    os_specific_chrome_paths()
        .into_iter()
        .find(|candidate| candidate.exists())
}

fn chrome_executable_names() -> &'static [&'static str] {
    #[cfg(target_os = "windows")]
    {
        &["chrome.exe", "chromium.exe", "msedge.exe"]
    }

    #[cfg(not(target_os = "windows"))]
    {
        &[
            "google-chrome-stable",
            "google-chrome",
            "chromium",
            "chromium-browser",
        ]
    }
}

fn os_specific_chrome_paths() -> Vec<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let mut paths = Vec::new();
        for key in ["PROGRAMFILES", "PROGRAMFILES(X86)", "LOCALAPPDATA"] {
            if let Ok(value) = env::var(key) {
                let root = PathBuf::from(value.trim());
                paths.push(root.join("Google/Chrome/Application/chrome.exe"));
                paths.push(root.join("Chromium/Application/chrome.exe"));
            }
        }
        paths
    }

    #[cfg(target_os = "macos")]
    {
        vec![
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"),
            PathBuf::from("/Applications/Chromium.app/Contents/MacOS/Chromium"),
        ]
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        vec![
            PathBuf::from("/usr/bin/google-chrome-stable"),
            PathBuf::from("/usr/bin/google-chrome"),
            PathBuf::from("/usr/bin/chromium-browser"),
            PathBuf::from("/usr/bin/chromium"),
        ]
    }
}
