//! Error types for the consolidation chain

use std::fmt;
use thiserror::Error;

use crate::record::TrackId;

/// Result type alias for the consolidation chain
pub type Result<T> = std::result::Result<T, ConsolidationError>;

/// Stage of the consolidation chain, used to label log lines and errors.
///
/// Pruning and status resolution cannot fail, so [`ConsolidationError::stage`]
/// never returns `Prune` or `Resolve`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Dispatch,
    Accumulate,
    Prune,
    Renumber,
    Resolve,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Dispatch => "dispatch",
            Stage::Accumulate => "accumulate",
            Stage::Prune => "prune",
            Stage::Renumber => "renumber",
            Stage::Resolve => "resolve",
        };
        f.write_str(name)
    }
}

/// Which link field a renumbering error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkField {
    MergeTarget,
    SplitSource,
}

impl fmt::Display for LinkField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkField::MergeTarget => f.write_str("merge target"),
            LinkField::SplitSource => f.write_str("split source"),
        }
    }
}

/// Fatal errors of the consolidation chain.
///
/// Frame-level producer failures are not represented here: they are
/// recovered inside the dispatcher.
#[derive(Error, Debug)]
pub enum ConsolidationError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("accumulate: frame {frame} folded after frame {previous}")]
    FrameOutOfOrder { frame: usize, previous: usize },

    #[error("accumulate: frame {frame} references track {track}, valid range is 1..={num_tracks}")]
    TrackOutOfRange {
        frame: usize,
        track: TrackId,
        num_tracks: usize,
    },

    #[error("renumber: track {track} step {step} has invalid {field} {link}")]
    InvalidLink {
        track: TrackId,
        step: usize,
        field: LinkField,
        link: i32,
    },

    #[error("dispatch: cancelled with {completed} of {total} frames complete")]
    Cancelled { completed: usize, total: usize },
}

impl ConsolidationError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Stage that raised the error
    pub fn stage(&self) -> Stage {
        match self {
            Self::Config(_) | Self::Cancelled { .. } => Stage::Dispatch,
            Self::FrameOutOfOrder { .. } | Self::TrackOutOfRange { .. } => Stage::Accumulate,
            Self::InvalidLink { .. } => Stage::Renumber,
        }
    }
}
