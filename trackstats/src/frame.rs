//! Frame-level inputs and per-frame result bundles

use crate::record::{CellRecord, TrackId};

/// One time step of the tracking matrix.
///
/// All per-cell vectors are parallel: index `c` describes cloud number `c + 1`
/// of the frame's source file.
#[derive(Debug, Clone, Default)]
pub struct FrameAssignment {
    /// Frame index (0-based, chronological)
    pub index: usize,
    /// Source file of this frame, relative to the input directory
    pub source_file: String,
    /// 1-based track of each cell; `0` or negative when unassigned
    pub track_of_cell: Vec<i32>,
    pub status: Vec<i32>,
    pub merge_target: Vec<i32>,
    pub split_source: Vec<i32>,
    pub reset_flag: Vec<i32>,
}

impl FrameAssignment {
    /// Number of cells described by this frame
    pub fn num_cells(&self) -> usize {
        self.track_of_cell.len()
    }

    /// Iterate `(cell_index, track_id)` for every cell assigned to a track
    pub fn assigned_cells(&self) -> impl Iterator<Item = (usize, TrackId)> + '_ {
        self.track_of_cell
            .iter()
            .enumerate()
            .filter(|(_, &track)| track > 0)
            .map(|(cell, &track)| (cell, track as TrackId))
    }

    /// Value of a parallel per-cell vector, or the sentinel when it is short
    pub fn cell_value(values: &[i32], cell: usize) -> i32 {
        values
            .get(cell)
            .copied()
            .unwrap_or(crate::record::FILL_VALUE)
    }
}

/// A cell's statistics together with the track it belongs to
#[derive(Debug, Clone)]
pub struct TrackedCell {
    pub track: TrackId,
    pub record: CellRecord,
}

/// Everything one frame contributes to the consolidation
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    pub frame: usize,
    /// Units attribute of the time coordinate (e.g. "seconds since 1970-01-01")
    pub basetime_units: String,
    pub cells: Vec<TrackedCell>,
}

impl FrameStats {
    pub fn new(frame: usize, basetime_units: impl Into<String>) -> Self {
        Self {
            frame,
            basetime_units: basetime_units.into(),
            cells: Vec::new(),
        }
    }

    pub fn push(&mut self, track: TrackId, record: CellRecord) {
        self.cells.push(TrackedCell { track, record });
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FILL_VALUE;

    #[test]
    fn test_assigned_cells_skips_unassigned() {
        let frame = FrameAssignment {
            index: 0,
            source_file: "cloudid_20200101_0000.json".to_string(),
            track_of_cell: vec![3, 0, -1, 1],
            ..Default::default()
        };

        let assigned: Vec<_> = frame.assigned_cells().collect();
        assert_eq!(assigned, vec![(0, 3), (3, 1)]);
        assert_eq!(frame.num_cells(), 4);
    }

    #[test]
    fn test_cell_value_falls_back_to_sentinel() {
        let values = vec![1, 2];
        assert_eq!(FrameAssignment::cell_value(&values, 1), 2);
        assert_eq!(FrameAssignment::cell_value(&values, 5), FILL_VALUE);
    }
}
