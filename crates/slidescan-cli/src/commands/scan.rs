use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use slidescan_core::acquire::AcquisitionSession;
use slidescan_core::config::{EstimatorMethod, PositionPolicy, SessionConfig};
use slidescan_core::io::source::DirectorySource;
use slidescan_core::naming::NamingScheme;
use slidescan_core::progress::ProgressReporter;
use tracing::warn;

use super::load_config;
use crate::progress::BarReporter;
use crate::summary::{print_levels_summary, print_scan_summary};

#[derive(Clone, ValueEnum)]
pub enum EstimatorArg {
    Features,
    PhaseCorrelation,
}

#[derive(Clone, ValueEnum)]
pub enum NamingArg {
    Index,
    Grid,
}

#[derive(Args)]
pub struct ScanArgs {
    /// Directory of frames (*.jpg, or *.png when no JPEG is present)
    pub frames: PathBuf,

    /// Session config file (TOML); overrides the flags below
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output root directory
    #[arg(short, long, default_value = "scan_output")]
    pub output: PathBuf,

    /// Tile edge length in pixels
    #[arg(long, default_value = "1024")]
    pub tile_size: u32,

    /// Overlap between consecutive tiles (0.0-0.99)
    #[arg(long, default_value = "0.1")]
    pub overlap: f64,

    /// Displacement estimator
    #[arg(long, value_enum, default_value = "features")]
    pub estimator: EstimatorArg,

    /// Tile file naming scheme
    #[arg(long, value_enum, default_value = "index")]
    pub naming: NamingArg,

    /// Round accumulated motion instead of truncating it
    #[arg(long)]
    pub round: bool,

    /// Generate pyramid levels after the scan
    #[arg(long)]
    pub levels: bool,
}

pub fn run(args: &ScanArgs) -> Result<()> {
    let config = match args.config {
        Some(ref path) => load_config(path)?,
        None => build_config_from_args(args),
    };

    let mut source = DirectorySource::open(&args.frames)
        .with_context(|| format!("Failed to open frames in {}", args.frames.display()))?;
    println!(
        "Scanning {} frames from {}",
        source.files().len(),
        args.frames.display()
    );

    let reporter: Arc<dyn ProgressReporter> = Arc::new(BarReporter::new());
    let mut session = AcquisitionSession::open(config)
        .context("Failed to open acquisition session")?;
    session.start();
    let run_result = session.run(&mut source, &reporter);
    if let Err(ref e) = run_result {
        warn!(error = %e, "Scan stopped early");
    }

    session.pause();
    let levels_result = if args.levels && !session.catalog().is_empty() {
        match session.generate_levels(&reporter) {
            Ok(catalog) => {
                print_levels_summary(catalog);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Pyramid generation failed, level-0 catalog kept");
                Err(e)
            }
        }
    } else {
        Ok(())
    };

    let scan_map = session.scan_map().clone();
    let config = session.config().clone();
    let stats = session.close().context("Failed to write catalog")?;
    print_scan_summary(&config, &stats, &scan_map);

    run_result.context("Scan did not complete")?;
    levels_result.context("Pyramid generation failed")
}

fn build_config_from_args(args: &ScanArgs) -> SessionConfig {
    let mut config = SessionConfig {
        output: args.output.clone(),
        tile_size: args.tile_size,
        overlap_fraction: args.overlap,
        ..Default::default()
    };
    config.estimator.method = match args.estimator {
        EstimatorArg::Features => EstimatorMethod::Features,
        EstimatorArg::PhaseCorrelation => EstimatorMethod::PhaseCorrelation,
    };
    config.naming = match args.naming {
        NamingArg::Index => NamingScheme::Index,
        NamingArg::Grid => NamingScheme::Grid,
    };
    if args.round {
        config.position_policy = PositionPolicy::Round;
    }
    config
}
