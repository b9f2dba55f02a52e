//! Run configuration for a statistics run

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use trackstats::ConsolidationConfig;

use crate::error::{Result, StatsError};

/// Settings of one track statistics run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Source of the data (e.g. "mergedir")
    pub datasource: String,

    /// Description of the data source
    pub datadescription: String,

    /// First time step of the run, `YYYYmmdd.HHMM`
    pub startdate: String,

    /// Last time step of the run, `YYYYmmdd.HHMM`
    pub enddate: String,

    /// Time gap tolerated by the upstream tracker, kept as a run attribute
    pub timegap: String,

    /// Prefix every cloud-id file name in the tracking matrix must carry
    pub cloudid_filebase: String,

    /// Directory holding the cloud-id files
    pub tracking_inpath: PathBuf,

    /// Directory holding the tracking matrix, also where statistics are written
    pub stats_path: PathBuf,

    /// Version tag of the single-track files
    pub track_version: String,

    /// Version tag of the tracking matrix
    pub tracknumbers_version: String,

    /// Header of the tracking matrix file
    pub tracknumbers_filebase: String,

    /// Worker pool, track length bound and statistics thresholds
    pub consolidation: ConsolidationConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            datasource: "mergedir".to_string(),
            datadescription: "mergedir".to_string(),
            startdate: String::new(),
            enddate: String::new(),
            timegap: "3.1h".to_string(),
            cloudid_filebase: "cloudid_".to_string(),
            tracking_inpath: PathBuf::from("tracking"),
            stats_path: PathBuf::from("stats"),
            track_version: "v1.00".to_string(),
            tracknumbers_version: "v1.00".to_string(),
            tracknumbers_filebase: "tracknumbers_v1.00".to_string(),
            consolidation: ConsolidationConfig::default(),
        }
    }
}

impl RunConfig {
    /// Load a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config: RunConfig = serde_json::from_str(&text)?;
        log::debug!("Loaded run configuration from {}", path.display());
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.startdate.is_empty() || self.enddate.is_empty() {
            return Err(StatsError::config("startdate and enddate are required"));
        }
        if self.tracknumbers_filebase.is_empty() {
            return Err(StatsError::config("tracknumbers_filebase is required"));
        }
        self.consolidation.validate()?;
        Ok(())
    }

    fn run_stem(&self) -> String {
        format!(
            "{}_{}_{}",
            self.tracknumbers_filebase, self.startdate, self.enddate
        )
    }

    /// `<stats_path>/<tracknumbers_filebase>_<startdate>_<enddate>.json`
    pub fn tracking_matrix_path(&self) -> PathBuf {
        self.stats_path.join(format!("{}.json", self.run_stem()))
    }

    /// `<stats_path>/stats_<tracknumbers_filebase>_<startdate>_<enddate>.json`
    pub fn output_path(&self) -> PathBuf {
        self.stats_path.join(format!("stats_{}.json", self.run_stem()))
    }
}
