//! Removes tracks that never received a step and compacts the numbering

use crate::arena::TrackArena;
use crate::record::TrackId;

/// Surviving original track ids, in ascending order.
///
/// The k-th entry (0-based) is the original id of compacted track `k + 1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compaction {
    surviving: Vec<TrackId>,
    /// Track count before pruning
    original_tracks: usize,
}

impl Compaction {
    pub fn surviving_ids(&self) -> &[TrackId] {
        &self.surviving
    }

    /// Number of compacted tracks
    pub fn len(&self) -> usize {
        self.surviving.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surviving.is_empty()
    }

    pub fn original_tracks(&self) -> usize {
        self.original_tracks
    }

    pub fn pruned_tracks(&self) -> usize {
        self.original_tracks - self.surviving.len()
    }

    /// Largest surviving original id
    pub fn max_surviving_id(&self) -> Option<TrackId> {
        self.surviving.last().copied()
    }

    /// Compacted id of an original id, if it survived
    pub fn new_id(&self, original: TrackId) -> Option<TrackId> {
        self.surviving
            .binary_search(&original)
            .ok()
            .map(|k| k as TrackId + 1)
    }

    /// Original id of a compacted id
    pub fn original_id(&self, new_id: TrackId) -> Option<TrackId> {
        let k = (new_id as usize).checked_sub(1)?;
        self.surviving.get(k).copied()
    }
}

/// Keep the tracks with at least one recorded step.
///
/// Row order and the step order inside each row are preserved, and the
/// compacted arena keeps the configured length bound rather than the observed
/// maximum so that output shapes do not depend on occupancy.
pub fn prune(arena: TrackArena) -> (TrackArena, Compaction) {
    let max_track_length = arena.max_track_length();
    let original_tracks = arena.num_tracks();

    let (surviving, records): (Vec<TrackId>, Vec<_>) = arena
        .into_records()
        .into_iter()
        .enumerate()
        .filter(|(_, record)| !record.is_empty())
        .map(|(slot, record)| (slot as TrackId + 1, record))
        .unzip();

    log::debug!(
        "Pruned {} of {} tracks",
        original_tracks - surviving.len(),
        original_tracks
    );

    (
        TrackArena::from_records(records, max_track_length),
        Compaction {
            surviving,
            original_tracks,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulate::TrackAccumulator;
    use crate::frame::FrameStats;
    use crate::record::CellRecord;

    fn arena_with(num_tracks: usize, frames: &[&[TrackId]]) -> TrackArena {
        let mut acc = TrackAccumulator::new(num_tracks, 4);
        for (index, tracks) in frames.iter().enumerate() {
            let mut stats = FrameStats::new(index, "s");
            for &track in tracks.iter() {
                stats.push(
                    track,
                    CellRecord {
                        basetime: index as f64,
                        cloud_number: track as i32,
                        ..Default::default()
                    },
                );
            }
            acc.fold_frame(stats).unwrap();
        }
        acc.finish().arena
    }

    #[test]
    fn test_prune_drops_empty_tracks() {
        let arena = arena_with(5, &[&[2, 5], &[5], &[2, 4]]);
        let (pruned, compaction) = prune(arena);

        assert_eq!(compaction.surviving_ids(), &[2, 4, 5]);
        assert_eq!(compaction.original_tracks(), 5);
        assert_eq!(compaction.pruned_tracks(), 2);
        assert_eq!(pruned.num_tracks(), 3);
        assert_eq!(pruned.max_track_length(), 4);
        assert_eq!(pruned.lengths(), vec![2, 1, 2]);

        // original track 5 is now track 3 with its steps untouched
        let track = pruned.get(3).unwrap();
        assert_eq!(track.frames(), &[0, 1]);
        assert_eq!(track.step(0).unwrap().cloud_number, 5);
    }

    #[test]
    fn test_prune_is_idempotent() {
        let arena = arena_with(4, &[&[1, 3], &[3]]);
        let (once, first) = prune(arena);
        let (twice, second) = prune(once.clone());

        assert_eq!(once.lengths(), twice.lengths());
        assert_eq!(second.surviving_ids(), &[1, 2]);
        assert_eq!(second.pruned_tracks(), 0);
        for ((_, a), (_, b)) in once.iter().zip(twice.iter()) {
            assert_eq!(a.frames(), b.frames());
        }
        assert_eq!(first.len(), second.len());
    }

    #[test]
    fn test_prune_all_empty() {
        let (pruned, compaction) = prune(TrackArena::new(3, 4));
        assert!(pruned.is_empty());
        assert!(compaction.is_empty());
        assert_eq!(compaction.max_surviving_id(), None);
    }

    #[test]
    fn test_id_lookups() {
        let arena = arena_with(4, &[&[2, 4]]);
        let (_, compaction) = prune(arena);
        assert_eq!(compaction.new_id(2), Some(1));
        assert_eq!(compaction.new_id(4), Some(2));
        assert_eq!(compaction.new_id(3), None);
        assert_eq!(compaction.original_id(2), Some(4));
        assert_eq!(compaction.original_id(0), None);
        assert_eq!(compaction.original_id(3), None);
    }
}
