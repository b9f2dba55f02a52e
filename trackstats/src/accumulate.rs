//! Folds per-frame result bundles into the track arena
//!
//! Frames are folded in increasing frame index, so the steps of every track
//! end up in chronological order no matter in which order the workers
//! finished computing them.

use crate::arena::{StepOutcome, TrackArena};
use crate::error::{ConsolidationError, Result};
use crate::frame::FrameStats;

/// Output of the accumulation stage
#[derive(Debug, Clone)]
pub struct Accumulated {
    pub arena: TrackArena,
    /// Units of the time coordinate, taken from the first non-empty frame
    pub basetime_units: Option<String>,
    pub frames_folded: usize,
    pub steps_recorded: usize,
    /// Steps discarded because their track was already at capacity
    pub dropped_steps: usize,
}

/// Single-threaded fold of frame results into a [`TrackArena`]
pub struct TrackAccumulator {
    arena: TrackArena,
    last_frame: Option<usize>,
    basetime_units: Option<String>,
    frames_folded: usize,
    steps_recorded: usize,
    dropped_steps: usize,
}

impl TrackAccumulator {
    /// Start from `num_tracks` empty tracks holding at most `max_track_length` steps each
    pub fn new(num_tracks: usize, max_track_length: usize) -> Self {
        Self {
            arena: TrackArena::new(num_tracks, max_track_length),
            last_frame: None,
            basetime_units: None,
            frames_folded: 0,
            steps_recorded: 0,
            dropped_steps: 0,
        }
    }

    pub fn arena(&self) -> &TrackArena {
        &self.arena
    }

    /// Fold one frame. Frames must arrive in strictly increasing index.
    pub fn fold_frame(&mut self, stats: FrameStats) -> Result<()> {
        let frame = stats.frame;
        if let Some(previous) = self.last_frame {
            if frame <= previous {
                return Err(ConsolidationError::FrameOutOfOrder { frame, previous });
            }
        }
        self.last_frame = Some(frame);

        if stats.cells.is_empty() {
            return Ok(());
        }
        if self.basetime_units.is_none() {
            self.basetime_units = Some(stats.basetime_units);
        }

        let num_tracks = self.arena.num_tracks();
        let max_track_length = self.arena.max_track_length();
        for tracked in stats.cells {
            let track = self
                .arena
                .get_mut(tracked.track)
                .ok_or(ConsolidationError::TrackOutOfRange {
                    frame,
                    track: tracked.track,
                    num_tracks,
                })?;

            match track.record_step(frame, tracked.record, max_track_length) {
                StepOutcome::Appended { .. } => self.steps_recorded += 1,
                StepOutcome::Replaced { slot } => {
                    log::debug!(
                        "Frame {} has several cells for track {}, keeping the last one at step {}",
                        frame,
                        tracked.track,
                        slot
                    );
                }
                StepOutcome::Dropped => {
                    self.dropped_steps += 1;
                    log::debug!(
                        "Track {} is at its {} step limit, frame {} not recorded",
                        tracked.track,
                        max_track_length,
                        frame
                    );
                }
                StepOutcome::Duplicate => {}
            }
        }

        self.frames_folded += 1;
        Ok(())
    }

    /// Fold a frame-indexed result vector. Absent frames are skipped.
    pub fn fold_all(&mut self, results: Vec<Option<FrameStats>>) -> Result<()> {
        for stats in results.into_iter().flatten() {
            self.fold_frame(stats)?;
        }
        Ok(())
    }

    pub fn finish(self) -> Accumulated {
        Accumulated {
            arena: self.arena,
            basetime_units: self.basetime_units,
            frames_folded: self.frames_folded,
            steps_recorded: self.steps_recorded,
            dropped_steps: self.dropped_steps,
        }
    }
}
