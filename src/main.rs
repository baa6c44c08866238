//! `tstore`: inspect and edit tree-structured item collections.

use clap::Parser;

mod cli;

fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run()
}
