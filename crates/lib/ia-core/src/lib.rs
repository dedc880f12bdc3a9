//! Core services for ia-mcp.
//!
//! This crate validates tool inputs, resolves the Internet Archive `ia`
//! executable, runs it with bounded time and output, and shapes its output for
//! the four read-only archive operations.

pub mod control;
pub mod error;
pub mod invoker;
pub mod resolver;
pub mod runner;
pub mod validate;

pub use error::{CliError, CliResult, OperationError};
