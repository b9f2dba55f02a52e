//! Cloud track statistics
//!
//! Reads a tracking matrix and its cloud-id frame files, measures every
//! tracked cloud, consolidates the measurements per track with `trackstats`
//! and writes one statistics file per run.

pub mod cloudid;
pub mod config;
pub mod error;
pub mod geometry;
pub mod producer;
pub mod runner;
pub mod tracking_matrix;
pub mod writer;

pub use cloudid::{CloudIdFrame, LatLonGrid};
pub use config::RunConfig;
pub use error::{Result, StatsError};
pub use producer::GridStatsProducer;
pub use runner::{RunSummary, StatsRunner};
pub use tracking_matrix::TrackingMatrix;
pub use writer::{RunAttributes, StatsFile, StatsWriter};
