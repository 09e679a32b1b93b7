//! Execution engine

use std::sync::Arc;

use async_trait::async_trait;
use cdp_adapter::{DeviceProfile, Session};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::allocator::SessionAllocator;
use crate::automation::Automation;
use crate::context::EvalContext;
use crate::errors::{FlowError, RunFailure};
use crate::result::RunResult;

/// Flow executor trait
#[async_trait]
pub trait FlowExecutor: Send + Sync {
    /// Run `automation` in a fresh session with fresh run state.
    async fn execute(&self, automation: &Automation) -> Result<RunResult, RunFailure>;
}

/// Default flow executor implementation
pub struct DefaultFlowExecutor {
    allocator: Arc<dyn SessionAllocator>,
    cancel: CancellationToken,
}

impl DefaultFlowExecutor {
    pub fn new(allocator: Arc<dyn SessionAllocator>) -> Self {
        Self {
            allocator,
            cancel: CancellationToken::new(),
        }
    }

    /// Cancelling `token` tears down whichever run is in flight.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

#[async_trait]
impl FlowExecutor for DefaultFlowExecutor {
    async fn execute(&self, automation: &Automation) -> Result<RunResult, RunFailure> {
        execute(automation, self.allocator.as_ref(), &self.cancel).await
    }
}

/// Open a session, optionally emulate a device, then run every action in
/// order.
///
/// The first failing action ends the run; everything produced before it is
/// returned in [`RunFailure::partial`].
pub async fn execute(
    automation: &Automation,
    allocator: &dyn SessionAllocator,
    cancel: &CancellationToken,
) -> Result<RunResult, RunFailure> {
    let mut result = RunResult::new();
    let mut ctx = EvalContext::new();

    let opened = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FlowError::Cancelled),
        session = allocator.new_session() => session.map_err(FlowError::SessionUnavailable),
    };
    let session = match opened {
        Ok(session) => session,
        Err(error) => return Err(RunFailure::new(error, result)),
    };

    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FlowError::Cancelled),
        outcome = run(automation, allocator, session.as_ref(), &mut ctx, &mut result) => outcome,
    };

    if let Err(err) = session.close().await {
        warn!(error = %err, "Failed to close browser session");
    }

    match outcome {
        Ok(()) => Ok(result),
        Err(error) => {
            warn!(error = %error, "Automation stopped");
            Err(RunFailure::new(error, result))
        }
    }
}

async fn run(
    automation: &Automation,
    allocator: &dyn SessionAllocator,
    session: &dyn Session,
    ctx: &mut EvalContext,
    result: &mut RunResult,
) -> Result<(), FlowError> {
    if let Some(id) = allocator.device_id() {
        match DeviceProfile::find(id) {
            Some(device) => {
                info!("Emulating device {} ({})", device.name, id);
                session
                    .emulate(device)
                    .await
                    .map_err(|source| FlowError::Emulation {
                        device: id.to_string(),
                        source,
                    })?;
            }
            None => warn!("device {:?} not found; running without emulation", id),
        }
    }

    automation.run(session, ctx, result).await
}
