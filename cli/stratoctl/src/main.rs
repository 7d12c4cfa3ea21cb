//! strato - CLI for the Strato cloud platform.

use anyhow::Result;
use clap::Parser;

use stratoctl::commands::Cli;
use stratoctl::{error, logging};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose());

    if let Err(e) = cli.run().await {
        error::print_error(&e);
        std::process::exit(1);
    }

    Ok(())
}
