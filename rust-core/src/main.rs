//! Swell wave estimator
//!
//! Command-line front end. For library use, see lib.rs.

mod cli;
mod simulate;

use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use swell_core::{logging, WaveConfig};

use crate::cli::{Cli, Command, InitConfigArgs};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Simulate(args) => simulate::run(args),
        Command::InitConfig(args) => init_config(args),
    }
}

fn init_config(args: InitConfigArgs) -> Result<()> {
    WaveConfig::default()
        .save(&args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;
    println!("Wrote default configuration to {}", args.output.display());
    Ok(())
}
