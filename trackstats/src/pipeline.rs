//! End-to-end consolidation: dispatch, accumulate, prune, renumber, resolve

use std::time::Instant;

use crate::accumulate::TrackAccumulator;
use crate::adjustor::{renumber_links, Adjustor, RenumberSummary};
use crate::config::ConsolidationConfig;
use crate::dispatch::{CancelFlag, DispatchOutcome, FrameStatsProducer, ParallelStatsDispatcher};
use crate::error::{Result, Stage};
use crate::frame::FrameAssignment;
use crate::prune::{prune, Compaction};
use crate::status::resolve_status;
use crate::table::TrackStatsTable;

/// Everything a consolidation run produces
#[derive(Debug, Clone)]
pub struct Consolidation {
    pub table: TrackStatsTable,
    /// Original ids of the rows of `table`
    pub compaction: Compaction,
    /// Units of `basetime`, `None` when no frame produced a cell
    pub basetime_units: Option<String>,
    pub failed_frames: Vec<usize>,
    pub empty_frames: usize,
    /// Steps lost to the track length bound
    pub dropped_steps: usize,
    pub links: RenumberSummary,
}

/// Run the full chain over `frames` for a tracking matrix of `num_tracks` tracks
pub fn consolidate<P: FrameStatsProducer>(
    frames: &[FrameAssignment],
    num_tracks: usize,
    producer: &P,
    config: &ConsolidationConfig,
) -> Result<Consolidation> {
    consolidate_with_cancel(frames, num_tracks, producer, config, &CancelFlag::new())
}

/// Like [`consolidate`], aborting with `Cancelled` if `cancel` is raised
/// while frames are being dispatched
pub fn consolidate_with_cancel<P: FrameStatsProducer>(
    frames: &[FrameAssignment],
    num_tracks: usize,
    producer: &P,
    config: &ConsolidationConfig,
    cancel: &CancelFlag,
) -> Result<Consolidation> {
    config.validate()?;
    let start = Instant::now();
    let max_track_length = config.max_track_length();

    log::info!(
        "[{}] {} frames on {} workers with {}",
        Stage::Dispatch,
        frames.len(),
        config.num_workers,
        producer.name()
    );
    let dispatcher = ParallelStatsDispatcher::new(config.num_workers)?;
    let DispatchOutcome {
        results,
        failed_frames,
        empty_frames,
    } = dispatcher.dispatch_with_cancel(frames, producer, cancel)?;

    log::info!(
        "[{}] {} tracks, at most {} steps each",
        Stage::Accumulate,
        num_tracks,
        max_track_length
    );
    let mut accumulator = TrackAccumulator::new(num_tracks, max_track_length);
    accumulator.fold_all(results)?;
    let accumulated = accumulator.finish();
    if accumulated.dropped_steps > 0 {
        log::info!(
            "{} steps dropped at the {} step limit",
            accumulated.dropped_steps,
            max_track_length
        );
    }

    log::info!(
        "[{}] {} steps recorded from {} frames",
        Stage::Prune,
        accumulated.steps_recorded,
        accumulated.frames_folded
    );
    let (mut arena, compaction) = prune(accumulated.arena);

    log::info!(
        "[{}] {} of {} tracks kept",
        Stage::Renumber,
        compaction.len(),
        compaction.original_tracks()
    );
    let adjustor = Adjustor::from_compaction(&compaction);
    let links = renumber_links(&mut arena, &adjustor)?;
    log::debug!(
        "{} links remapped, {} cleared",
        links.remapped,
        links.cleared
    );

    log::info!("[{}] {} tracks", Stage::Resolve, arena.num_tracks());
    let statuses = resolve_status(&arena);
    let table = TrackStatsTable::build(&arena, &statuses);

    log::info!(
        "Consolidated {} tracks in {:.2}s",
        table.num_tracks(),
        start.elapsed().as_secs_f32()
    );

    Ok(Consolidation {
        table,
        compaction,
        basetime_units: accumulated.basetime_units,
        failed_frames,
        empty_frames,
        dropped_steps: accumulated.dropped_steps,
        links,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConsolidationError;
    use crate::frame::FrameStats;
    use crate::record::{CellRecord, FILL_VALUE};
    use crate::table::IntField;

    fn config(workers: usize, max_len: usize) -> ConsolidationConfig {
        ConsolidationConfig {
            num_workers: workers,
            length_range: [1, max_len],
            ..Default::default()
        }
    }

    fn echo(frame: &FrameAssignment) -> anyhow::Result<Option<FrameStats>> {
        let mut stats = FrameStats::new(frame.index, "seconds since 1970-01-01 00:00:00");
        for (cell, track) in frame.assigned_cells() {
            stats.push(
                track,
                CellRecord {
                    basetime: frame.index as f64 * 1800.0,
                    cloud_number: cell as i32 + 1,
                    status: FrameAssignment::cell_value(&frame.status, cell),
                    merge_target: FrameAssignment::cell_value(&frame.merge_target, cell),
                    split_source: FrameAssignment::cell_value(&frame.split_source, cell),
                    ..Default::default()
                },
            );
        }
        Ok(Some(stats))
    }

    #[test]
    fn test_consolidate_renumbers_links() {
        // track 2 never appears, track 3 merges into track 4
        let frames = vec![
            FrameAssignment {
                index: 0,
                track_of_cell: vec![1, 3, 4],
                status: vec![0, 0, 0],
                merge_target: vec![FILL_VALUE, 4, FILL_VALUE],
                split_source: vec![FILL_VALUE, FILL_VALUE, 2],
                ..Default::default()
            },
            FrameAssignment {
                index: 1,
                track_of_cell: vec![4, 0],
                status: vec![2, 0],
                merge_target: vec![FILL_VALUE, FILL_VALUE],
                split_source: vec![FILL_VALUE, FILL_VALUE],
                ..Default::default()
            },
        ];
        let result = consolidate(&frames, 4, &echo, &config(2, 5)).unwrap();

        assert_eq!(result.compaction.surviving_ids(), &[1, 3, 4]);
        let table = &result.table;
        assert_eq!(table.length.to_vec(), vec![1, 1, 2]);
        assert_eq!(table.int(IntField::MergeTarget)[[1, 0]], 3);
        assert_eq!(table.int(IntField::SplitSource)[[2, 0]], FILL_VALUE);
        assert_eq!(table.end_status[2], 2);
        assert_eq!(result.links.remapped, 1);
        assert_eq!(result.links.cleared, 1);
        assert_eq!(
            result.basetime_units.as_deref(),
            Some("seconds since 1970-01-01 00:00:00")
        );
    }

    #[test]
    fn test_consolidate_without_frames() {
        let result = consolidate(&[], 3, &echo, &config(2, 5)).unwrap();
        assert!(result.table.is_empty());
        assert!(result.basetime_units.is_none());
        assert_eq!(result.compaction.pruned_tracks(), 3);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let err = consolidate(&[], 3, &echo, &config(0, 5)).unwrap_err();
        assert!(matches!(err, ConsolidationError::Config(_)));
    }
}
