//! Configuration consumed by the consolidation chain

use serde::{Deserialize, Serialize};

use crate::error::{ConsolidationError, Result};

/// Thresholds handed to the frame statistics producer.
///
/// The consolidation chain does not interpret these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsThresholds {
    /// Minimum core + cold anvil area of a tracked cloud (km²)
    pub area_thresh: f64,
    /// Brightness temperature thresholds (K): core, cold anvil, warm anvil, cloud edge
    pub cloudtb_threshs: [f64; 4],
    /// Valid brightness temperature range (K)
    pub absolute_tb_threshs: [f64; 2],
    /// Pixel radius (km)
    pub pixel_radius: f64,
    /// Domain limits: lat_min, lon_min, lat_max, lon_max
    pub geolimits: [f64; 4],
}

impl Default for StatsThresholds {
    fn default() -> Self {
        Self {
            area_thresh: 800.0,
            cloudtb_threshs: [225.0, 241.0, 261.0, 261.0],
            absolute_tb_threshs: [160.0, 330.0],
            pixel_radius: 4.0,
            geolimits: [-90.0, -180.0, 90.0, 180.0],
        }
    }
}

/// Settings of one consolidation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidationConfig {
    /// Size of the frame statistics worker pool
    pub num_workers: usize,
    /// Track lifetime range `[min, max]` in steps; `max` bounds the stored length
    pub length_range: [usize; 2],
    pub thresholds: StatsThresholds,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            num_workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            length_range: [2, 120],
            thresholds: StatsThresholds::default(),
        }
    }
}

impl ConsolidationConfig {
    /// Allocation bound on the number of steps per track
    pub fn max_track_length(&self) -> usize {
        self.length_range[0].max(self.length_range[1])
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_workers == 0 {
            return Err(ConsolidationError::config("num_workers must be at least 1"));
        }
        if self.max_track_length() == 0 {
            return Err(ConsolidationError::config(
                "length_range must allow at least one step",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_track_length_uses_upper_bound() {
        let config = ConsolidationConfig {
            length_range: [2, 60],
            ..Default::default()
        };
        assert_eq!(config.max_track_length(), 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_pool() {
        let config = ConsolidationConfig {
            num_workers: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConsolidationError::Config(_))
        ));

        let config = ConsolidationConfig {
            length_range: [0, 0],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
