//! docflow CLI: run configured document pipelines.
//!
//! Reads a `docflow.toml`, wires its pipelines into an engine, and runs them.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
