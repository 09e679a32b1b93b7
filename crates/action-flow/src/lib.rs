//! Automation compiler and execution engine
//!
//! Typed tasks are bound to [`Action`]s, collected into an [`Automation`] and
//! run strictly in order against a browser [`Session`](cdp_adapter::Session).
//! Each run gets a fresh [`EvalContext`] for variables produced by earlier
//! steps and a fresh [`RunResult`] collecting named outputs and files.

pub mod allocator;
pub mod automation;
pub mod binder;
pub mod context;
pub mod errors;
pub mod executor;
pub mod result;

pub use allocator::{Allocator, SessionAllocator};
pub use automation::Automation;
pub use binder::{bind, Action, VERSION_OUTPUT};
pub use context::{decode_string_map, EvalContext};
pub use errors::{FlowError, RunFailure};
pub use executor::{execute, DefaultFlowExecutor, FlowExecutor};
pub use result::{PersistReport, RunResult};
