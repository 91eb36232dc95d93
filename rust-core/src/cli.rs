use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Swell wave estimator.
#[derive(Parser)]
#[command(
    name = "swell-core",
    version,
    about = "Wave height, period and direction from inertial sensors"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Run the estimator over a synthetic sea state.
    Simulate(SimulateArgs),
    /// Write the default configuration as TOML.
    InitConfig(InitConfigArgs),
}

/// Arguments for the `simulate` subcommand.
#[derive(clap::Args)]
pub struct SimulateArgs {
    /// Path to TOML configuration file. Defaults apply when absent.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Significant wave height of the synthetic swell, metres.
    #[arg(long, default_value_t = 1.5)]
    pub height: f64,

    /// Swell period, seconds.
    #[arg(long, default_value_t = 8.0)]
    pub period: f64,

    /// Phase of the north axis against the east axis, degrees.
    #[arg(long, default_value_t = 90.0)]
    pub direction: f64,

    /// Boat heading reported by the magnetometer, degrees.
    #[arg(long)]
    pub heading: Option<f64>,

    /// Simulated duration, seconds.
    #[arg(long, default_value_t = 120.0)]
    pub duration: f64,

    /// Sensor sampling rate, Hz.
    #[arg(long, default_value_t = 50.0)]
    pub rate: f64,

    /// Seconds of samples between analysis cycles.
    #[arg(long, default_value_t = 2.0)]
    pub interval: f64,

    /// Emit one JSON object per cycle instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `init-config` subcommand.
#[derive(clap::Args)]
pub struct InitConfigArgs {
    /// Output path for the configuration file.
    #[arg(short, long, default_value = "swell.toml")]
    pub output: PathBuf,
}
