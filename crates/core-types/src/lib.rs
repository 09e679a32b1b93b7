//! Shared task model for soulscript.
//!
//! Automation files decode into these types; the compiler in `action-flow`
//! only ever sees well-typed values.

pub mod automation;
pub mod duration;
pub mod error;
pub mod expression;
pub mod selector;
pub mod task;

pub use automation::{Automation, AutomationFile, FileFormat};
pub use error::{DecodeError, ExpressionError, TokenError};
pub use expression::{Expression, Variables};
pub use selector::{Options, Selector, SelectorBy, SelectorOn};
pub use task::{ElementTask, Eval, Navigate, Screenshot, Sleep, Task, Title, DEFAULT_SCREENSHOT_NAME};
