//! Arena of track records addressed by 1-based track id
//!
//! Each record owns the chronological steps recorded for its track. The
//! per-track length (the "next free slot") is only advanced by the
//! accumulator, which runs on a single thread.

use crate::record::{CellRecord, TrackId, FILL_VALUE};

/// What happened to a cell handed to [`TrackRecord::record_step`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Written to a new slot
    Appended { slot: usize },
    /// Replaced the step already recorded for the same frame
    Replaced { slot: usize },
    /// Track is at capacity, the step was not stored
    Dropped,
    /// Another cell of a frame whose step was already dropped
    Duplicate,
}

/// Time series of one track
#[derive(Debug, Clone)]
pub struct TrackRecord {
    steps: Vec<CellRecord>,
    /// Frame index of each recorded step
    frames: Vec<usize>,
    /// Last frame that contributed, recorded or not
    last_frame: Option<usize>,
    track_interruptions: i32,
    dropped_steps: usize,
}

impl Default for TrackRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackRecord {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            frames: Vec::new(),
            last_frame: None,
            track_interruptions: FILL_VALUE,
            dropped_steps: 0,
        }
    }

    /// Number of recorded steps
    #[inline]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[CellRecord] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&CellRecord> {
        self.steps.get(index)
    }

    /// Frame index of each recorded step, in step order
    pub fn frames(&self) -> &[usize] {
        &self.frames
    }

    pub fn track_interruptions(&self) -> i32 {
        self.track_interruptions
    }

    /// Steps that arrived after the track reached its capacity
    pub fn dropped_steps(&self) -> usize {
        self.dropped_steps
    }

    pub(crate) fn steps_mut(&mut self) -> &mut [CellRecord] {
        &mut self.steps
    }

    /// Place `cell` from `frame` into the next open slot.
    ///
    /// A track receives at most one step per frame: a second cell from the
    /// same frame overwrites the first.
    pub(crate) fn record_step(
        &mut self,
        frame: usize,
        cell: CellRecord,
        max_track_length: usize,
    ) -> StepOutcome {
        if self.last_frame == Some(frame) {
            return match self.frames.last() {
                Some(&last) if last == frame => {
                    let slot = self.steps.len() - 1;
                    self.track_interruptions = cell.track_interruptions;
                    self.steps[slot] = cell;
                    StepOutcome::Replaced { slot }
                }
                _ => StepOutcome::Duplicate,
            };
        }

        self.last_frame = Some(frame);
        if self.steps.len() >= max_track_length {
            self.dropped_steps += 1;
            return StepOutcome::Dropped;
        }

        self.track_interruptions = cell.track_interruptions;
        self.steps.push(cell);
        self.frames.push(frame);
        StepOutcome::Appended {
            slot: self.steps.len() - 1,
        }
    }
}

/// Fixed-size arena of `num_tracks` records, each bounded by `max_track_length`
#[derive(Debug, Clone)]
pub struct TrackArena {
    tracks: Vec<TrackRecord>,
    max_track_length: usize,
}

impl TrackArena {
    /// Create an arena of empty tracks with ids `1..=num_tracks`
    pub fn new(num_tracks: usize, max_track_length: usize) -> Self {
        Self {
            tracks: (0..num_tracks).map(|_| TrackRecord::new()).collect(),
            max_track_length,
        }
    }

    pub(crate) fn from_records(tracks: Vec<TrackRecord>, max_track_length: usize) -> Self {
        Self {
            tracks,
            max_track_length,
        }
    }

    pub(crate) fn into_records(self) -> Vec<TrackRecord> {
        self.tracks
    }

    #[inline]
    pub fn num_tracks(&self) -> usize {
        self.tracks.len()
    }

    #[inline]
    pub fn max_track_length(&self) -> usize {
        self.max_track_length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, id: TrackId) -> Option<&TrackRecord> {
        let slot = Self::slot(id)?;
        self.tracks.get(slot)
    }

    pub(crate) fn get_mut(&mut self, id: TrackId) -> Option<&mut TrackRecord> {
        let slot = Self::slot(id)?;
        self.tracks.get_mut(slot)
    }

    /// Iterate `(track_id, record)` in ascending id
    pub fn iter(&self) -> impl Iterator<Item = (TrackId, &TrackRecord)> {
        self.tracks
            .iter()
            .enumerate()
            .map(|(slot, record)| (slot as TrackId + 1, record))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (TrackId, &mut TrackRecord)> {
        self.tracks
            .iter_mut()
            .enumerate()
            .map(|(slot, record)| (slot as TrackId + 1, record))
    }

    /// Recorded length of every track, indexed by `id - 1`
    pub fn lengths(&self) -> Vec<usize> {
        self.tracks.iter().map(TrackRecord::len).collect()
    }

    /// Steps dropped across all tracks because of the length bound
    pub fn dropped_steps(&self) -> usize {
        self.tracks.iter().map(TrackRecord::dropped_steps).sum()
    }

    fn slot(id: TrackId) -> Option<usize> {
        (id as usize).checked_sub(1)
    }
}
