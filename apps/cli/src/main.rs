//! lineagebook CLI: turns raw lineage records into a typeset lineage book.
//!
//! Reads delimited student records and teacher bios, validates them, and
//! renders a LaTeX document that is compiled to PDF.

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
