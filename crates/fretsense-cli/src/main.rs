mod commands;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fretsense", about = "Ratiometric FRET calibration and imaging")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show channel image dimensions and intensity statistics
    Info(commands::info::InfoArgs),
    /// Print a default session config as TOML
    Config(commands::config::ConfigArgs),
    /// Compute calibration factors from control-sample images
    Calibrate(commands::calibrate::CalibrateArgs),
    /// Compute the alpha factor (optionally via photobleaching)
    Alpha(commands::alpha::AlphaArgs),
    /// Compose a FRET efficiency image from donor/transfer/acceptor images
    Compose(commands::compose::ComposeArgs),
    /// Divide one image by another, pixel by pixel
    Ratio(commands::ratio::RatioArgs),
    /// Split an image into in-mask and out-of-mask parts
    Partition(commands::ratio::PartitionArgs),
    /// Run a FRET session described by a TOML config
    Run(commands::run::RunArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Info(args) => commands::info::run(args),
        Commands::Config(args) => commands::config::run(args),
        Commands::Calibrate(args) => commands::calibrate::run(args),
        Commands::Alpha(args) => commands::alpha::run(args),
        Commands::Compose(args) => commands::compose::run(args),
        Commands::Ratio(args) => commands::ratio::run_ratio(args),
        Commands::Partition(args) => commands::ratio::run_partition(args),
        Commands::Run(args) => commands::run::run(args),
    }
}
