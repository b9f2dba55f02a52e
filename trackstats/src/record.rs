//! Per-cell statistics and the sentinel conventions shared by every stage

/// Integer marker for "no data" and "no link"
pub const FILL_VALUE: i32 = -9999;

/// 1-based track identifier, as numbered by the tracking matrix
pub type TrackId = u32;

/// Statistics of one tracked cell at one time step.
///
/// Floating-point fields use NaN for "no data", integer fields use
/// [`FILL_VALUE`] and text fields are empty.
#[derive(Debug, Clone)]
pub struct CellRecord {
    /// Seconds since 1970-01-01
    pub basetime: f64,
    /// Cloud number of this cell in its source file
    pub cloud_number: i32,
    pub source_file: String,
    /// `YYYYmmdd_HHMM`
    pub datetime: String,

    pub mean_lat: f64,
    pub mean_lon: f64,
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
    /// Equivalent radius of the core and cold anvil (km)
    pub radius: f64,
    /// Equivalent radius of core, cold anvil and warm anvil (km)
    pub radius_warm_anvil: f64,
    pub major_axis: f64,
    /// Degrees counter-clockwise from the grid x axis
    pub orientation: f64,
    pub eccentricity: f64,
    pub perimeter: f64,
    pub x_center: f64,
    pub y_center: f64,
    pub x_weighted_center: f64,
    pub y_weighted_center: f64,

    pub min_tb: f64,
    pub mean_tb: f64,
    pub core_mean_tb: f64,

    pub n_core_cold: i32,
    pub n_core: i32,
    pub n_cold: i32,
    pub n_warm: i32,
    /// 1 when the cell touches the edge of the data domain
    pub boundary: i32,

    // Pass-through from the tracking matrix
    pub status: i32,
    pub merge_target: i32,
    pub split_source: i32,
    pub track_interruptions: i32,
}

impl Default for CellRecord {
    fn default() -> Self {
        Self {
            basetime: f64::NAN,
            cloud_number: FILL_VALUE,
            source_file: String::new(),
            datetime: String::new(),
            mean_lat: f64::NAN,
            mean_lon: f64::NAN,
            min_lat: f64::NAN,
            min_lon: f64::NAN,
            max_lat: f64::NAN,
            max_lon: f64::NAN,
            radius: f64::NAN,
            radius_warm_anvil: f64::NAN,
            major_axis: f64::NAN,
            orientation: f64::NAN,
            eccentricity: f64::NAN,
            perimeter: f64::NAN,
            x_center: f64::NAN,
            y_center: f64::NAN,
            x_weighted_center: f64::NAN,
            y_weighted_center: f64::NAN,
            min_tb: f64::NAN,
            mean_tb: f64::NAN,
            core_mean_tb: f64::NAN,
            n_core_cold: FILL_VALUE,
            n_core: FILL_VALUE,
            n_cold: FILL_VALUE,
            n_warm: FILL_VALUE,
            boundary: FILL_VALUE,
            status: FILL_VALUE,
            merge_target: FILL_VALUE,
            split_source: FILL_VALUE,
            track_interruptions: FILL_VALUE,
        }
    }
}

/// True when a merge/split value refers to a track rather than "no link"
#[inline]
pub fn is_link(value: i32) -> bool {
    value != FILL_VALUE
}
