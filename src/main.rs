//! runcache binary - inspect and maintain the cross-run test cache

use anyhow::Result;
use clap::Parser;

use runcache::cli;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    cli::init_tracing(args.verbose);
    cli::run(args)
}
