//! wikicorpus CLI: build a text corpus from Wikipedia categories.
//!
//! Reads a JSON file mapping group labels to category names, harvests the
//! articles of every category and writes them as JSON or CSV.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
