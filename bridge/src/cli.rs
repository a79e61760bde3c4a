//! Command-line interface definitions for the bridge API service.

use clap::{Parser, Subcommand};
use sitebridge_common::LogFormat;

/// Top-level command-line interface definition.
#[derive(Debug, Parser)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = env!("CARGO_PKG_DESCRIPTION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands for the bridge API service.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the HTTP API bridging requests to the site-management tool.
    Serve(ServiceArgs),
}

/// Arguments for the serve command.
#[derive(Debug, Parser)]
pub struct ServiceArgs {
    /// Path to the TOML configuration file.
    #[arg(
        short,
        long,
        env = "SITEBRIDGE_API_CONFIG",
        default_value = "sitebridge.toml"
    )]
    pub config: String,

    /// Optional override for the listen port (overrides port in config)
    #[arg(long)]
    pub port: Option<u16>,

    /// Optional override for the bind address (overrides bind in config)
    #[arg(long)]
    pub bind: Option<String>,

    /// Log output format.
    #[arg(long, value_enum, default_value_t)]
    pub log_format: LogFormat,
}
