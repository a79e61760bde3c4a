//! Library entry for the bridge API service.
//!
//! Exposes `inner_main` so the binary shim (and integration tests) can call
//! into the service logic.

pub mod cli;
pub mod config;
pub mod http;
pub mod inventory;
pub mod parser;
pub mod validate;

use std::fs;

use eyre::WrapErr as _;
use sitebridge_common::{default_level, init_tracing};
use tracing::info;

use cli::{Cli, Command};

/// The bridge API's main function; can be called from a shim binary.
///
/// # Errors
///
/// Returns an error if the config cannot be resolved or the server fails to
/// start.
pub async fn inner_main(invocation: Cli) -> eyre::Result<()> {
    match invocation.command {
        Command::Serve(args) => {
            init_tracing(args.log_format, default_level());

            let config = &args.config;
            let config_path =
                fs::canonicalize(config).wrap_err(format!("Config file not found at: {config}"))?;

            info!(config_path = %config_path.display(), "Starting bridge API");

            http::start(&config_path, args.port, args.bind.as_deref()).await
        }
    }
}
