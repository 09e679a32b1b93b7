//! Backend selection: attach to a remote browser or launch a local one

use async_trait::async_trait;
use cdp_adapter::config::CdpConfig;
use cdp_adapter::{AdapterError, ChromiumSession, Session};
use tracing::info;

/// Opens browser sessions for automation runs.
#[async_trait]
pub trait SessionAllocator: Send + Sync {
    /// Open a fresh session. The caller closes it when the run ends.
    async fn new_session(&self) -> Result<Box<dyn Session>, AdapterError>;

    /// Requested device emulation id, if any.
    fn device_id(&self) -> Option<&str>;
}

/// Chromium allocator.
#[derive(Clone, Debug, Default)]
pub struct Allocator {
    browser_url: Option<String>,
    device_id: Option<String>,
    config: CdpConfig,
}

impl Allocator {
    pub fn new(config: CdpConfig) -> Self {
        Self {
            browser_url: None,
            device_id: None,
            config,
        }
    }

    /// Attach to the browser at `url` instead of launching one.
    pub fn with_browser_url(mut self, url: Option<String>) -> Self {
        self.browser_url = url.filter(|url| !url.trim().is_empty());
        self
    }

    /// Request device emulation. Unknown ids are reported when the run starts.
    pub fn with_device_id(mut self, id: Option<String>) -> Self {
        self.device_id = id.filter(|id| !id.trim().is_empty());
        self
    }

    pub fn browser_url(&self) -> Option<&str> {
        self.browser_url.as_deref()
    }

    pub fn config(&self) -> &CdpConfig {
        &self.config
    }
}

#[async_trait]
impl SessionAllocator for Allocator {
    async fn new_session(&self) -> Result<Box<dyn Session>, AdapterError> {
        let session = match &self.browser_url {
            Some(url) => {
                info!(url = %url, "Attaching to remote browser");
                ChromiumSession::connect(url, &self.config).await?
            }
            None => {
                info!("Launching local browser");
                ChromiumSession::launch(&self.config).await?
            }
        };
        Ok(Box::new(session))
    }

    fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }
}
