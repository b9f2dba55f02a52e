//! Old-id to new-id mapping after pruning, and the merge/split rewrite
//!
//! Building the table and applying it are separate steps: every link value is
//! an id from the pre-pruning numbering, so all of them must be resolved
//! against a complete table in one pass.

use crate::arena::TrackArena;
use crate::error::{ConsolidationError, LinkField, Result};
use crate::prune::Compaction;
use crate::record::{is_link, TrackId, FILL_VALUE};

/// Dense mapping from every original id in `1..=max_surviving` to its
/// compacted id, or [`FILL_VALUE`] when that track was pruned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adjustor {
    /// Indexed by original id; slot 0 is unused
    table: Vec<i32>,
}

impl Adjustor {
    pub fn from_compaction(compaction: &Compaction) -> Self {
        let size = compaction.max_surviving_id().map_or(0, |id| id as usize) + 1;
        let mut table = vec![FILL_VALUE; size];
        for (k, &original) in compaction.surviving_ids().iter().enumerate() {
            table[original as usize] = k as i32 + 1;
        }
        Self { table }
    }

    /// Largest original id covered by the table
    pub fn max_original_id(&self) -> TrackId {
        (self.table.len() - 1) as TrackId
    }

    /// Resolve one stored link value.
    ///
    /// Returns `None` for values that cannot be a track id (zero or negative
    /// other than the sentinel). Ids of pruned tracks and ids past the table
    /// resolve to the sentinel.
    pub fn resolve(&self, link: i32) -> Option<i32> {
        if link == FILL_VALUE {
            return Some(FILL_VALUE);
        }
        if link < 1 {
            return None;
        }
        Some(self.table.get(link as usize).copied().unwrap_or(FILL_VALUE))
    }
}

/// Counts from one renumbering pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenumberSummary {
    /// Links that still point at a track
    pub remapped: usize,
    /// Links whose target was pruned or out of range
    pub cleared: usize,
}

/// Rewrite every merge target and split source of `arena` through `adjustor`.
///
/// All links are resolved before any is written, so on error the arena keeps
/// its original numbering.
pub fn renumber_links(arena: &mut TrackArena, adjustor: &Adjustor) -> Result<RenumberSummary> {
    let mut summary = RenumberSummary::default();
    let mut resolved = Vec::new();

    for (track, record) in arena.iter() {
        for (step, cell) in record.steps().iter().enumerate() {
            let mut pair = [FILL_VALUE; 2];
            for (slot, (field, original)) in [
                (LinkField::MergeTarget, cell.merge_target),
                (LinkField::SplitSource, cell.split_source),
            ]
            .into_iter()
            .enumerate()
            {
                let value = adjustor
                    .resolve(original)
                    .ok_or(ConsolidationError::InvalidLink {
                        track,
                        step,
                        field,
                        link: original,
                    })?;
                if is_link(original) {
                    if value == FILL_VALUE {
                        summary.cleared += 1;
                    } else {
                        summary.remapped += 1;
                    }
                }
                pair[slot] = value;
            }
            resolved.push(pair);
        }
    }

    let cells = arena
        .iter_mut()
        .flat_map(|(_, record)| record.steps_mut().iter_mut());
    for (cell, [merge_target, split_source]) in cells.zip(resolved) {
        cell.merge_target = merge_target;
        cell.split_source = split_source;
    }

    Ok(summary)
}
