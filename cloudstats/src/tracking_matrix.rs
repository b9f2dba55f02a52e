//! Tracking matrix produced by the upstream tracker
//!
//! For every frame (cloud-id file) and every cloud number in it, the matrix
//! stores the track the cloud belongs to, its status code, and the tracks it
//! merges into or splits from.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use trackstats::FrameAssignment;

use crate::error::{Result, StatsError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackingMatrix {
    /// Number of tracks before pruning
    pub ntracks: usize,
    /// One cloud-id file per frame, chronological
    pub cloudid_files: Vec<String>,
    /// `[frame][cell]` 1-based track number, `0` or negative when untracked
    pub track_numbers: Vec<Vec<i32>>,
    pub track_status: Vec<Vec<i32>>,
    pub track_mergenumbers: Vec<Vec<i32>>,
    pub track_splitnumbers: Vec<Vec<i32>>,
    pub track_reset: Vec<Vec<i32>>,
}

impl TrackingMatrix {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let matrix: TrackingMatrix = serde_json::from_str(&text)?;
        matrix.validate()?;
        log::info!(
            "Loaded tracking matrix {} ({} tracks, {} files)",
            path.display(),
            matrix.ntracks,
            matrix.nfiles()
        );
        Ok(matrix)
    }

    pub fn nfiles(&self) -> usize {
        self.cloudid_files.len()
    }

    /// Check that all per-frame tables agree on the frame and cell counts
    pub fn validate(&self) -> Result<()> {
        let nfiles = self.nfiles();
        let tables = [
            ("track_status", &self.track_status),
            ("track_mergenumbers", &self.track_mergenumbers),
            ("track_splitnumbers", &self.track_splitnumbers),
            ("track_reset", &self.track_reset),
        ];

        if self.track_numbers.len() != nfiles {
            return Err(StatsError::tracking_matrix(format!(
                "track_numbers has {} frames, cloudid_files has {}",
                self.track_numbers.len(),
                nfiles
            )));
        }
        for (name, table) in tables {
            if table.len() != nfiles {
                return Err(StatsError::tracking_matrix(format!(
                    "{} has {} frames, cloudid_files has {}",
                    name,
                    table.len(),
                    nfiles
                )));
            }
            for (frame, (cells, tracks)) in table.iter().zip(&self.track_numbers).enumerate() {
                if cells.len() != tracks.len() {
                    return Err(StatsError::tracking_matrix(format!(
                        "{} frame {} has {} cells, track_numbers has {}",
                        name,
                        frame,
                        cells.len(),
                        tracks.len()
                    )));
                }
            }
        }

        if let Some(&max) = self.track_numbers.iter().flatten().max() {
            if max > 0 && max as usize > self.ntracks {
                return Err(StatsError::tracking_matrix(format!(
                    "track number {} exceeds ntracks {}",
                    max, self.ntracks
                )));
            }
        }
        Ok(())
    }

    /// Check that every listed cloud-id file starts with `filebase`
    pub fn check_file_names(&self, filebase: &str) -> Result<()> {
        match self
            .cloudid_files
            .iter()
            .position(|file| !file.starts_with(filebase))
        {
            Some(frame) => Err(StatsError::tracking_matrix(format!(
                "cloud-id file {} of frame {} does not start with {}",
                self.cloudid_files[frame], frame, filebase
            ))),
            None => Ok(()),
        }
    }

    /// Per-frame assignments, in frame order
    pub fn frames(&self) -> Vec<FrameAssignment> {
        self.cloudid_files
            .iter()
            .enumerate()
            .map(|(index, file)| FrameAssignment {
                index,
                source_file: file.clone(),
                track_of_cell: self.track_numbers[index].clone(),
                status: self.track_status[index].clone(),
                merge_target: self.track_mergenumbers[index].clone(),
                split_source: self.track_splitnumbers[index].clone(),
                reset_flag: self.track_reset[index].clone(),
            })
            .collect()
    }
}
