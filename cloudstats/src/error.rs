//! Error types for the cloud statistics application

use std::path::Path;
use thiserror::Error;
use trackstats::ConsolidationError;

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, StatsError>;

/// Errors that can occur while loading inputs, consolidating or writing output
#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid tracking matrix: {0}")]
    TrackingMatrixError(String),

    #[error("Invalid cloud-id file {path}: {reason}")]
    CloudIdError { path: String, reason: String },

    #[error("Invalid grid dimensions: expected {expected:?}, got {actual:?}")]
    InvalidDimensions {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Consolidation failed: {0}")]
    Consolidation(#[from] ConsolidationError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl StatsError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn tracking_matrix<S: Into<String>>(msg: S) -> Self {
        Self::TrackingMatrixError(msg.into())
    }

    pub fn cloudid<S: Into<String>>(path: &Path, reason: S) -> Self {
        Self::CloudIdError {
            path: path.display().to_string(),
            reason: reason.into(),
        }
    }

    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }
}
