pub mod app;
pub mod check;
pub mod commands;
pub mod context;
pub mod devices;
pub mod dispatch;
pub mod env;
pub mod expr;
pub mod list;
pub mod output;
pub mod run;
pub mod runtime;

pub use check::{cmd_check, CheckArgs};
pub use expr::{parse_invocation, ExprError, Invocation, Source, Step};
pub use run::{cmd_run, RunArgs};
