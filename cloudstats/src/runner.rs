//! One statistics run: load the tracking matrix, consolidate, write

use std::path::PathBuf;
use std::time::Instant;

use trackstats::{consolidate_with_cancel, CancelFlag};

use crate::config::RunConfig;
use crate::error::{Result, StatsError};
use crate::producer::GridStatsProducer;
use crate::tracking_matrix::TrackingMatrix;
use crate::writer::{RunAttributes, StatsWriter};

/// What a finished run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub output: PathBuf,
    pub num_tracks: usize,
    pub original_tracks: usize,
    pub failed_frames: Vec<usize>,
    pub dropped_steps: usize,
}

pub struct StatsRunner {
    config: RunConfig,
    output: PathBuf,
    cancel: CancelFlag,
}

impl StatsRunner {
    pub fn new(config: RunConfig) -> Result<Self> {
        config.validate()?;
        let output = config.output_path();
        Ok(Self {
            config,
            output,
            cancel: CancelFlag::new(),
        })
    }

    /// Write to `output` instead of the default location in `stats_path`
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    /// Flag that aborts the run while frames are being processed
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn run(&self) -> Result<RunSummary> {
        let start = Instant::now();
        let matrix = TrackingMatrix::from_file(self.config.tracking_matrix_path())?;
        matrix.check_file_names(&self.config.cloudid_filebase)?;
        let first_file = matrix
            .cloudid_files
            .first()
            .ok_or_else(|| StatsError::tracking_matrix("no cloud-id files listed"))?;

        let producer = GridStatsProducer::from_first_file(
            &self.config.tracking_inpath,
            first_file,
            self.config.consolidation.thresholds.clone(),
        )?;

        let frames = matrix.frames();
        let result = consolidate_with_cancel(
            &frames,
            matrix.ntracks,
            &producer,
            &self.config.consolidation,
            &self.cancel,
        )?;
        if !result.failed_frames.is_empty() {
            log::warn!(
                "{} of {} frames failed and contribute no cells",
                result.failed_frames.len(),
                frames.len()
            );
        }

        let attributes = RunAttributes::new(&self.config, &result);
        StatsWriter::new(&self.output).write(attributes, &result)?;

        log::info!(
            "Statistics run {} - {} done in {:.1}s",
            self.config.startdate,
            self.config.enddate,
            start.elapsed().as_secs_f32()
        );
        Ok(RunSummary {
            output: self.output.clone(),
            num_tracks: result.table.num_tracks(),
            original_tracks: result.compaction.original_tracks(),
            failed_frames: result.failed_frames,
            dropped_steps: result.dropped_steps,
        })
    }
}
