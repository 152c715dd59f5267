//! mdmerge CLI: merge markdown documents into one AI-ready file.
//!
//! Resolves input paths and configuration, runs the merge engine, and writes
//! the result. The engine itself never touches the output location.

mod commands;
mod discover;
mod output;

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
