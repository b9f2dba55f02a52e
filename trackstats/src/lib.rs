//! Track statistics consolidation
//!
//! Turns per-frame cell statistics into per-track time series. A tracking
//! matrix assigns every cell of every frame to a track; this crate runs a
//! [`FrameStatsProducer`] over all frames in parallel and consolidates its
//! output:
//!
//! 1. [`ParallelStatsDispatcher`] computes frame bundles on a worker pool
//! 2. [`TrackAccumulator`] folds them, in frame order, into a [`TrackArena`]
//! 3. [`prune`] drops tracks without steps and compacts the numbering
//! 4. [`Adjustor`] and [`renumber_links`] rewrite merge/split links to the new ids
//! 5. [`resolve_status`] derives start and end status per track
//!
//! [`consolidate`] runs the whole chain and returns a dense [`TrackStatsTable`].
//!
//! ```rust,ignore
//! use trackstats::{consolidate, ConsolidationConfig, FrameAssignment, FrameStats};
//!
//! let producer = |frame: &FrameAssignment| -> anyhow::Result<Option<FrameStats>> {
//!     // compute cell statistics for frame.source_file
//! };
//! let result = consolidate(&frames, num_tracks, &producer, &ConsolidationConfig::default())?;
//! println!("{} tracks", result.table.num_tracks());
//! ```

pub mod accumulate;
pub mod adjustor;
pub mod arena;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod frame;
pub mod pipeline;
pub mod prune;
pub mod record;
pub mod status;
pub mod table;

pub use accumulate::{Accumulated, TrackAccumulator};
pub use adjustor::{renumber_links, Adjustor, RenumberSummary};
pub use arena::{TrackArena, TrackRecord};
pub use config::{ConsolidationConfig, StatsThresholds};
pub use dispatch::{CancelFlag, DispatchOutcome, FrameStatsProducer, ParallelStatsDispatcher};
pub use error::{ConsolidationError, LinkField, Result, Stage};
pub use frame::{FrameAssignment, FrameStats, TrackedCell};
pub use pipeline::{consolidate, consolidate_with_cancel, Consolidation};
pub use prune::{prune, Compaction};
pub use record::{is_link, CellRecord, TrackId, FILL_VALUE};
pub use status::{resolve_status, StatusPair};
pub use table::{FloatField, IntField, TextField, TrackStatsTable};
