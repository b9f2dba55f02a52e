//! Frame statistics computed from cloud-id grid files

use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use trackstats::{CellRecord, FrameAssignment, FrameStats, FrameStatsProducer, StatsThresholds};

use crate::cloudid::{CloudIdFrame, LatLonGrid};
use crate::error::{Result, StatsError};
use crate::geometry::{measure_cell, PixelIndex};

/// Loads each frame's cloud-id file and measures every tracked cloud in it
pub struct GridStatsProducer {
    tracking_inpath: PathBuf,
    grid: LatLonGrid,
    thresholds: StatsThresholds,
}

impl GridStatsProducer {
    pub fn new(
        tracking_inpath: impl Into<PathBuf>,
        grid: LatLonGrid,
        thresholds: StatsThresholds,
    ) -> Self {
        Self {
            tracking_inpath: tracking_inpath.into(),
            grid,
            thresholds,
        }
    }

    /// Read the lat/lon grid from `first_file` and build the producer
    pub fn from_first_file(
        tracking_inpath: impl Into<PathBuf>,
        first_file: &str,
        thresholds: StatsThresholds,
    ) -> Result<Self> {
        let tracking_inpath = tracking_inpath.into();
        let grid = LatLonGrid::from_file(tracking_inpath.join(first_file))?;
        Ok(Self::new(tracking_inpath, grid, thresholds))
    }

    pub fn grid(&self) -> &LatLonGrid {
        &self.grid
    }

    fn frame_path(&self, frame: &FrameAssignment) -> PathBuf {
        self.tracking_inpath.join(&frame.source_file)
    }
}

impl FrameStatsProducer for GridStatsProducer {
    fn produce(&self, frame: &FrameAssignment) -> anyhow::Result<Option<FrameStats>> {
        if frame.assigned_cells().next().is_none() {
            return Ok(None);
        }

        let path = self.frame_path(frame);
        let cloudid = CloudIdFrame::from_file(&path)
            .with_context(|| format!("loading {}", path.display()))?;
        if cloudid.dim() != self.grid.dim() {
            return Err(StatsError::InvalidDimensions {
                expected: self.grid.latitude.shape().to_vec(),
                actual: cloudid.cloudnumber.shape().to_vec(),
            })
            .with_context(|| format!("grid of {}", path.display()));
        }

        let datetime = datetime_string(cloudid.basetime)
            .with_context(|| format!("basetime {} of {}", cloudid.basetime, path.display()))?;
        let pixels = PixelIndex::build(&cloudid.cloudnumber);

        let cells: Vec<_> = frame
            .assigned_cells()
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|(cell, track)| {
                let cloud_number = cell + 1;
                let measured = measure_cell(
                    cloud_number as i32,
                    pixels.pixels(cloud_number),
                    &cloudid,
                    &self.grid,
                    &self.thresholds,
                );
                let record = CellRecord {
                    basetime: cloudid.basetime,
                    source_file: frame.source_file.clone(),
                    datetime: datetime.clone(),
                    status: FrameAssignment::cell_value(&frame.status, cell),
                    merge_target: FrameAssignment::cell_value(&frame.merge_target, cell),
                    split_source: FrameAssignment::cell_value(&frame.split_source, cell),
                    track_interruptions: FrameAssignment::cell_value(&frame.reset_flag, cell),
                    ..measured
                };
                (track, record)
            })
            .collect();

        log::debug!(
            "Frame {} ({}): {} tracked of {} clouds",
            frame.index,
            frame.source_file,
            cells.len(),
            pixels.num_clouds()
        );

        let mut stats = FrameStats::new(frame.index, cloudid.basetime_units);
        for (track, record) in cells {
            stats.push(track, record);
        }
        Ok(Some(stats))
    }

    fn name(&self) -> &str {
        "grid-stats"
    }
}

/// `YYYYmmdd_HHMM` of a time in seconds since the epoch
pub fn datetime_string(basetime: f64) -> Result<String> {
    if !basetime.is_finite() {
        return Err(StatsError::other(format!("time {} is not finite", basetime)));
    }
    let time = DateTime::<Utc>::from_timestamp(basetime.round() as i64, 0)
        .ok_or_else(|| StatsError::other(format!("time {} out of range", basetime)))?;
    Ok(time.format("%Y%m%d_%H%M").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use serde_json::json;
    use std::path::Path;
    use trackstats::FILL_VALUE;

    fn write_cloudid(dir: &Path, name: &str, basetime: f64) {
        let value = json!({
            "basetime": basetime,
            "latitude": [[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [2.0, 2.0, 2.0]],
            "longitude": [[5.0, 6.0, 7.0], [5.0, 6.0, 7.0], [5.0, 6.0, 7.0]],
            "cloudnumber": [[1, 1, 0], [1, 0, 0], [0, 0, 2]],
            "tb": [[200.0, 210.0, 290.0], [230.0, 290.0, 290.0], [290.0, 290.0, 215.0]],
        });
        std::fs::write(dir.join(name), value.to_string()).unwrap();
    }

    fn assignment(file: &str) -> FrameAssignment {
        FrameAssignment {
            index: 4,
            source_file: file.to_string(),
            track_of_cell: vec![7, 3],
            status: vec![0, 13],
            merge_target: vec![3, FILL_VALUE],
            split_source: vec![FILL_VALUE, FILL_VALUE],
            reset_flag: vec![0, 1],
        }
    }

    #[test]
    fn test_datetime_string() {
        assert_eq!(datetime_string(1305590400.0).unwrap(), "20110517_0000");
        assert_eq!(datetime_string(1305592200.0).unwrap().len(), 13);
    }

    #[test]
    fn test_datetime_string_rejects_non_finite() {
        assert!(datetime_string(f64::NAN).is_err());
        assert!(datetime_string(f64::INFINITY).is_err());
    }

    #[test]
    fn test_produce_tracked_cells() {
        let dir = tempfile::tempdir().unwrap();
        write_cloudid(dir.path(), "cloudid_0.json", 1305590400.0);
        let producer = GridStatsProducer::from_first_file(
            dir.path(),
            "cloudid_0.json",
            StatsThresholds::default(),
        )
        .unwrap();

        let stats = producer
            .produce(&assignment("cloudid_0.json"))
            .unwrap()
            .unwrap();
        assert_eq!(stats.frame, 4);
        assert_eq!(stats.cells.len(), 2);

        let first = &stats.cells[0];
        assert_eq!(first.track, 7);
        assert_eq!(first.record.cloud_number, 1);
        assert_eq!(first.record.n_core_cold, 3);
        assert_eq!(first.record.merge_target, 3);
        assert_eq!(first.record.datetime, "20110517_0000");
        assert_eq!(first.record.source_file, "cloudid_0.json");
        assert_abs_diff_eq!(first.record.mean_lat, 1.0 / 3.0, epsilon = 1e-12);

        let second = &stats.cells[1];
        assert_eq!(second.track, 3);
        assert_eq!(second.record.status, 13);
        assert_eq!(second.record.track_interruptions, 1);
        assert_eq!(second.record.boundary, 1);
    }

    #[test]
    fn test_untracked_frame_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_cloudid(dir.path(), "cloudid_0.json", 0.0);
        let producer = GridStatsProducer::from_first_file(
            dir.path(),
            "cloudid_0.json",
            StatsThresholds::default(),
        )
        .unwrap();

        let mut frame = assignment("missing.json");
        frame.track_of_cell = vec![0, -1];
        assert!(producer.produce(&frame).unwrap().is_none());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_cloudid(dir.path(), "cloudid_0.json", 0.0);
        let producer = GridStatsProducer::from_first_file(
            dir.path(),
            "cloudid_0.json",
            StatsThresholds::default(),
        )
        .unwrap();

        let err = producer.produce(&assignment("missing.json")).unwrap_err();
        assert!(format!("{:#}", err).contains("missing.json"));
    }
}
