//! Track statistics for one tracking run
//!
//! Usage:
//!   cloudstats --config run.json [--workers 8] [--output stats.json]

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use cloudstats::{RunConfig, StatsRunner};

/// Consolidate per-frame cloud statistics into per-track records
#[derive(Parser, Debug)]
#[command(name = "cloudstats", version, about)]
struct Cli {
    /// Run configuration (JSON)
    #[arg(long, value_name = "FILE")]
    config: PathBuf,

    /// Worker threads for per-frame statistics
    #[arg(long)]
    workers: Option<usize>,

    /// Output file, defaults to stats_<tracknumbers>_<start>_<end>.json in stats_path
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Override the track length range, e.g. --length-range 2 120
    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"])]
    length_range: Option<Vec<usize>>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = RunConfig::from_file(&cli.config)
        .with_context(|| format!("reading {}", cli.config.display()))?;
    if let Some(workers) = cli.workers {
        config.consolidation.num_workers = workers;
    }
    if let Some(range) = cli.length_range {
        config.consolidation.length_range = [range[0], range[1]];
    }

    let mut runner = StatsRunner::new(config)?;
    if let Some(output) = cli.output {
        runner = runner.with_output(output);
    }

    let summary = runner.run()?;
    log::info!(
        "{} of {} tracks written to {}",
        summary.num_tracks,
        summary.original_tracks,
        summary.output.display()
    );
    if !summary.failed_frames.is_empty() {
        log::warn!("Failed frames: {:?}", summary.failed_frames);
    }
    Ok(())
}
