//! `json-cipher` — command-line entry point.
//!
//! Startup sequence:
//! 1. Parse the command line.
//! 2. Initialise logging.
//! 3. Run the file pipeline for the requested action.
//!
//! Exits non-zero if any file had to be skipped, while still processing the
//! rest of the batch first.

mod cli;
mod pipeline;
mod telemetry;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    telemetry::init(args.verbose)?;

    let summary = pipeline::run(args.command.action(), args.command.job())?;
    if summary.skipped > 0 {
        anyhow::bail!(
            "{} file(s) skipped, {} processed",
            summary.skipped,
            summary.processed
        );
    }
    Ok(())
}
