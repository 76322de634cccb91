mod commands;
mod progress;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "slidescan", about = "Motion-triggered slide scanning and mosaic stitching")]
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
    /// Acquire tiles from a directory of frames
    Scan(commands::scan::ScanArgs),
    /// Generate pyramid levels 1-7 from a scan's level-0 tiles
    Levels(commands::levels::LevelsArgs),
    /// Stitch one level into a mosaic
    Stitch(commands::stitch::StitchArgs),
    /// Show catalog contents of a scan output directory
    Info(commands::info::InfoArgs),
    /// Compare a mosaic against a reference image
    Compare(commands::compare::CompareArgs),
    /// Print a default session config as TOML
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Scan(args) => commands::scan::run(args),
        Commands::Levels(args) => commands::levels::run(args),
        Commands::Stitch(args) => commands::stitch::run(args),
        Commands::Info(args) => commands::info::run(args),
        Commands::Compare(args) => commands::compare::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
