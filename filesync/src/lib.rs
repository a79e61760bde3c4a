//! Library entry for the file-sync service.
//!
//! Exposes `inner_main` so the binary shim (and integration tests) can call
//! into the service logic.

pub mod classify;
pub mod cli;
pub mod config;
pub mod debounce;
pub mod dispatch;
pub mod ignore;
pub mod server;
pub mod watcher;
pub mod ws;

use std::fs;

use eyre::WrapErr as _;
use sitebridge_common::{default_level, init_tracing};
use tracing::info;

use cli::{Cli, Command};

/// The file-sync service's main function; can be called from a shim binary.
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

            info!(config_path = %config_path.display(), "Starting file-sync service");

            server::start(&config_path, args.port, args.bind.as_deref()).await
        }
    }
}
