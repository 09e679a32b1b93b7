//! Selector resolution.
//!
//! A task names its element with an optional plain selector plus any number
//! of structured selectors. This crate flattens those inputs into the
//! ordered list of [`QuerySpec`](cdp_adapter::QuerySpec) values the backend
//! runs one after another.

pub mod resolver;

pub use resolver::*;
