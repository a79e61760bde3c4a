//! Binary entrypoint for the bridge API service.

use clap::Parser as _;
use sitebridge_api::cli::Cli;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let invocation = Cli::parse();
    sitebridge_api::inner_main(invocation).await
}
