//! SoulScript library
//!
//! Exposes the CLI, configuration and workspace modules for integration testing

pub mod cli;
pub mod config;
pub mod workspace;

pub use config::AppConfig;
pub use workspace::{read_automation_file, Workspace, WorkspaceError};
