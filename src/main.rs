mod cli;
mod client;
mod error;
mod history;
mod logging;
mod map;
mod model;
mod orchestrator;
mod presenter;
mod stage;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let one_shot = args.json || args.text;

    cli::run(args).await?;
    if one_shot {
        // Don't wait on lingering runtime tasks once the output is written.
        std::process::exit(0);
    }
    Ok(())
}
