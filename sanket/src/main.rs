//! Sanket - red light stop-waypoint detector
//!
//! Replays a scenario file through the threaded detector in ground-truth
//! mode and reports the stop waypoints it published.
//!
//! ```text
//! sanket --config configs/sanket.yaml --scenario scenarios/red_light.yaml
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use sanket::io::{Scenario, replay};
use sanket::{Result, SanketConfig};

#[derive(Parser)]
#[command(name = "sanket")]
#[command(about = "Replay a traffic light scenario through the stop-waypoint detector")]
struct Args {
    /// Detector configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scenario file to replay
    #[arg(short, long)]
    scenario: PathBuf,

    /// Override the debounce threshold from the config
    #[arg(long)]
    threshold: Option<u32>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("sanket=info")),
        )
        .init();

    let args = Args::parse();
    info!("Sanket v{}", env!("CARGO_PKG_VERSION"));

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            SanketConfig::load(path)?
        }
        None => {
            info!("Using default configuration");
            SanketConfig::default()
        }
    };
    if let Some(threshold) = args.threshold {
        config.detector.state_count_threshold = threshold;
        config.validate()?;
    }

    info!("Loading scenario from {:?}", args.scenario);
    let scenario = Scenario::load(&args.scenario)?;

    let report = replay(&config, &scenario)?;

    info!(
        "Scenario '{}': {} frames processed, {} dropped",
        report.scenario, report.frames_processed, report.frames_dropped
    );
    let stops = report.stops();
    if stops.is_empty() {
        info!("No red light stops published");
    } else {
        info!("Published stops at waypoints {:?}", stops);
    }
    if let Some(last) = report.final_output() {
        info!("Final output: {}", last);
    }
    Ok(())
}
