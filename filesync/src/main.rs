//! Binary entrypoint for the file-sync service.

use clap::Parser as _;
use sitebridge_filesync::cli::Cli;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let invocation = Cli::parse();
    sitebridge_filesync::inner_main(invocation).await
}
