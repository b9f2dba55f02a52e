//! Start and end status of each track

use crate::arena::TrackArena;
use crate::record::FILL_VALUE;

/// Status code at the first and last recorded step of a track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPair {
    pub start: i32,
    pub end: i32,
}

impl Default for StatusPair {
    fn default() -> Self {
        Self {
            start: FILL_VALUE,
            end: FILL_VALUE,
        }
    }
}

/// Resolve start/end status for every track of `arena`, in id order.
/// A track without steps gets the sentinel for both.
pub fn resolve_status(arena: &TrackArena) -> Vec<StatusPair> {
    arena
        .iter()
        .map(|(_, record)| match (record.steps().first(), record.steps().last()) {
            (Some(first), Some(last)) => StatusPair {
                start: first.status,
                end: last.status,
            },
            _ => StatusPair::default(),
        })
        .collect()
}
