//! The backend interface the execution engine drives.

use async_trait::async_trait;
use serde_json::Value;

use crate::commands::{BrowserVersion, QueryAction, QuerySpec};
use crate::devices::DeviceProfile;
use crate::error::AdapterError;

/// One attached browser page.
///
/// Calls are issued strictly one at a time by the engine; implementations
/// may still run their own background I/O.
#[async_trait]
pub trait Session: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), AdapterError>;

    async fn navigate_forward(&self) -> Result<(), AdapterError>;

    async fn navigate_back(&self) -> Result<(), AdapterError>;

    async fn reload(&self) -> Result<(), AdapterError>;

    async fn stop(&self) -> Result<(), AdapterError>;

    /// Evaluate `script` and return its JSON result by value.
    async fn evaluate(&self, script: &str) -> Result<Value, AdapterError>;

    async fn title(&self) -> Result<String, AdapterError>;

    /// Wait until `query` is satisfied, then perform `action` on the match.
    async fn query_action(&self, action: QueryAction, query: &QuerySpec)
        -> Result<(), AdapterError>;

    /// PNG of the current viewport.
    async fn capture_screenshot(&self) -> Result<Vec<u8>, AdapterError>;

    /// PNG clipped to the element matched by `query`, optionally rendered at
    /// `scale`.
    async fn element_screenshot(
        &self,
        query: &QuerySpec,
        scale: Option<f64>,
    ) -> Result<Vec<u8>, AdapterError>;

    async fn emulate(&self, device: &DeviceProfile) -> Result<(), AdapterError>;

    async fn version(&self) -> Result<BrowserVersion, AdapterError>;

    /// Release the page, and the browser process when this session launched it.
    async fn close(&self) -> Result<(), AdapterError>;
}
