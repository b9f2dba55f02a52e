//! Cloud-id frame files
//!
//! One JSON file per time step with the labelled cloud grid and the
//! brightness temperature it was derived from. Every file repeats the
//! latitude/longitude grid; it is read once per run.

use std::fs;
use std::path::Path;

use ndarray::Array2;
use serde::Deserialize;

use crate::error::{Result, StatsError};

#[derive(Deserialize)]
struct RawCloudIdFile {
    basetime: f64,
    #[serde(default = "default_units")]
    basetime_units: String,
    #[serde(default)]
    latitude: Vec<Vec<f64>>,
    #[serde(default)]
    longitude: Vec<Vec<f64>>,
    cloudnumber: Vec<Vec<i32>>,
    /// `null` for missing pixels
    tb: Vec<Vec<Option<f64>>>,
}

fn default_units() -> String {
    "seconds since 1970-01-01 00:00:00".to_string()
}

/// Labelled clouds and brightness temperature of one time step
#[derive(Debug, Clone)]
pub struct CloudIdFrame {
    /// Seconds since the epoch
    pub basetime: f64,
    pub basetime_units: String,
    /// `(ny, nx)` cloud number of each pixel, `0` for clear sky
    pub cloudnumber: Array2<i32>,
    /// `(ny, nx)` brightness temperature (K), NaN where missing
    pub tb: Array2<f64>,
}

impl CloudIdFrame {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = read_raw(path)?;

        let cloudnumber = to_array(raw.cloudnumber, "cloudnumber", path)?;
        let tb = to_array(
            raw.tb
                .into_iter()
                .map(|row| row.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
                .collect(),
            "tb",
            path,
        )?;
        if tb.dim() != cloudnumber.dim() {
            return Err(StatsError::InvalidDimensions {
                expected: cloudnumber.shape().to_vec(),
                actual: tb.shape().to_vec(),
            });
        }

        Ok(Self {
            basetime: raw.basetime,
            basetime_units: raw.basetime_units,
            cloudnumber,
            tb,
        })
    }

    pub fn dim(&self) -> (usize, usize) {
        self.cloudnumber.dim()
    }
}

/// Pixel coordinates shared by all frames of a run
#[derive(Debug, Clone)]
pub struct LatLonGrid {
    pub latitude: Array2<f64>,
    pub longitude: Array2<f64>,
}

impl LatLonGrid {
    /// Read the coordinate grid stored in a cloud-id file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = read_raw(path)?;
        let latitude = to_array(raw.latitude, "latitude", path)?;
        let longitude = to_array(raw.longitude, "longitude", path)?;
        if latitude.dim() != longitude.dim() {
            return Err(StatsError::InvalidDimensions {
                expected: latitude.shape().to_vec(),
                actual: longitude.shape().to_vec(),
            });
        }
        log::debug!(
            "Loaded {}x{} lat/lon grid from {}",
            latitude.nrows(),
            latitude.ncols(),
            path.display()
        );
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn dim(&self) -> (usize, usize) {
        self.latitude.dim()
    }
}

fn read_raw(path: &Path) -> Result<RawCloudIdFile> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| StatsError::cloudid(path, e.to_string()))
}

fn to_array<T: Clone>(rows: Vec<Vec<T>>, name: &str, path: &Path) -> Result<Array2<T>> {
    let ny = rows.len();
    let nx = rows.first().map_or(0, |row| row.len());
    if ny == 0 || nx == 0 {
        return Err(StatsError::cloudid(path, format!("{} grid is empty", name)));
    }
    if let Some((y, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != nx) {
        return Err(StatsError::cloudid(
            path,
            format!("{} row {} has {} columns, expected {}", name, y, row.len(), nx),
        ));
    }

    let data: Vec<T> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((ny, nx), data).map_err(|e| StatsError::cloudid(path, e.to_string()))
}
