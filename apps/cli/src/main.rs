//! pathscout CLI — related-gene and drug discovery over KEGG pathways.
//!
//! Scans the pathway maps a gene participates in, ranks the genes it
//! relates to, and lists the drugs known to target them.

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
