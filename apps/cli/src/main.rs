//! linkcurator CLI — maintenance passes over a corpus of dance-history
//! term-link and resource-link JSON files.
//!
//! Rewrites ambiguous or misspelled Wikipedia links from rule tables and
//! prunes resource links that no longer resolve.

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
