//! examarchive CLI: browse, search, upload, and analyze archived exam papers
//! through the archive API, with an offline cache for full-text search.

mod commands;
mod context;
mod render;

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
