//! Shared plumbing for the sitebridge services.
//!
//! This crate provides:
//! - Bounded subprocess execution with captured output ([`command`])
//! - Tracing/logging bootstrap shared by both service binaries ([`logging`])
//! - Graceful shutdown signal handling ([`shutdown`])

pub mod command;
pub mod logging;
pub mod shutdown;

pub use command::{CommandResult, CommandRunner, RunError, ToolRunner};
pub use logging::{LogFormat, default_level, init_tracing};
pub use shutdown::shutdown_signal;
