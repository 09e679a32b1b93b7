//! Flow execution error types

use cdp_adapter::AdapterError;
use thiserror::Error;

use crate::result::RunResult;

/// Flow execution errors
#[derive(Debug, Error)]
pub enum FlowError {
    /// A backend call made by one step failed
    #[error("{step} failed: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: AdapterError,
    },

    /// The allocator could not provide a browser session
    #[error("failed to open browser session: {0}")]
    SessionUnavailable(#[source] AdapterError),

    /// Applying a device profile failed
    #[error("failed to emulate device {device}: {source}")]
    Emulation {
        device: String,
        #[source]
        source: AdapterError,
    },

    /// The run was cancelled from outside
    #[error("automation cancelled")]
    Cancelled,

    /// Output value could not be serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A failed run together with everything produced before the failure.
#[derive(Debug, Error)]
#[error("automation run failed")]
pub struct RunFailure {
    #[source]
    pub error: FlowError,
    pub partial: RunResult,
}

impl RunFailure {
    pub fn new(error: FlowError, partial: RunResult) -> Self {
        Self { error, partial }
    }
}
