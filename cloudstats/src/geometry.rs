//! Geometric and radiometric statistics of one labelled cloud
//!
//! Pixels of a cloud are classified by brightness temperature against
//! `cloudtb_threshs`: core below `[0]`, cold anvil below `[1]`, warm anvil
//! below `[2]`. Shape statistics use the core + cold anvil pixels.

use ndarray::Array2;
use trackstats::{CellRecord, StatsThresholds};

use crate::cloudid::{CloudIdFrame, LatLonGrid};

/// Pixel positions of every cloud number in a frame
#[derive(Debug, Clone, Default)]
pub struct PixelIndex {
    /// `cells[n - 1]` holds the `(y, x)` pixels of cloud number `n`
    cells: Vec<Vec<(usize, usize)>>,
}

impl PixelIndex {
    pub fn build(cloudnumber: &Array2<i32>) -> Self {
        let max = cloudnumber.iter().copied().max().unwrap_or(0).max(0) as usize;
        let mut cells = vec![Vec::new(); max];
        for ((y, x), &n) in cloudnumber.indexed_iter() {
            if n > 0 {
                cells[n as usize - 1].push((y, x));
            }
        }
        Self { cells }
    }

    /// Pixels of cloud number `n`, empty when the frame has no such cloud
    pub fn pixels(&self, cloud_number: usize) -> &[(usize, usize)] {
        cloud_number
            .checked_sub(1)
            .and_then(|slot| self.cells.get(slot))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn num_clouds(&self) -> usize {
        self.cells.len()
    }
}

/// Measure one cloud. Fields not derivable from the grid keep their sentinel.
pub fn measure_cell(
    cloud_number: i32,
    pixels: &[(usize, usize)],
    frame: &CloudIdFrame,
    grid: &LatLonGrid,
    thresholds: &StatsThresholds,
) -> CellRecord {
    let [core_thresh, cold_thresh, warm_thresh, _] = thresholds.cloudtb_threshs;
    let [min_valid, max_valid] = thresholds.absolute_tb_threshs;
    let (ny, nx) = frame.dim();

    let mut record = CellRecord {
        cloud_number,
        ..Default::default()
    };

    let mut corecold = Vec::with_capacity(pixels.len());
    let (mut n_core, mut n_cold, mut n_warm) = (0, 0, 0);
    for &(y, x) in pixels {
        let tb = frame.tb[[y, x]];
        if tb < core_thresh {
            n_core += 1;
            corecold.push((y, x));
        } else if tb < cold_thresh {
            n_cold += 1;
            corecold.push((y, x));
        } else if tb < warm_thresh {
            n_warm += 1;
        }
    }
    record.n_core = n_core;
    record.n_cold = n_cold;
    record.n_warm = n_warm;
    record.n_core_cold = n_core + n_cold;

    record.boundary = pixels
        .iter()
        .any(|&(y, x)| y == 0 || x == 0 || y + 1 == ny || x + 1 == nx) as i32;

    let area_per_pixel = thresholds.pixel_radius * thresholds.pixel_radius;
    record.radius_warm_anvil =
        equivalent_radius((n_core + n_cold + n_warm) as f64 * area_per_pixel);

    if corecold.is_empty() {
        return record;
    }
    record.radius = equivalent_radius(record.n_core_cold as f64 * area_per_pixel);

    // position
    let count = corecold.len() as f64;
    let (mut lat_sum, mut lon_sum) = (0.0, 0.0);
    let (mut min_lat, mut max_lat) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_lon, mut max_lon) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y_sum, mut x_sum) = (0.0, 0.0);
    for &(y, x) in &corecold {
        let (lat, lon) = (grid.latitude[[y, x]], grid.longitude[[y, x]]);
        lat_sum += lat;
        lon_sum += lon;
        min_lat = min_lat.min(lat);
        max_lat = max_lat.max(lat);
        min_lon = min_lon.min(lon);
        max_lon = max_lon.max(lon);
        y_sum += y as f64;
        x_sum += x as f64;
    }
    record.mean_lat = lat_sum / count;
    record.mean_lon = lon_sum / count;
    record.min_lat = min_lat;
    record.max_lat = max_lat;
    record.min_lon = min_lon;
    record.max_lon = max_lon;
    record.y_center = y_sum / count;
    record.x_center = x_sum / count;

    // shape
    let ellipse = Ellipse::fit(&corecold, record.y_center, record.x_center);
    record.major_axis = ellipse.major_axis * thresholds.pixel_radius;
    record.orientation = ellipse.orientation;
    record.eccentricity = ellipse.eccentricity;
    record.perimeter = edge_pixels(&corecold, cloud_number, frame, cold_thresh) as f64
        * thresholds.pixel_radius;

    // brightness temperature within the valid range
    let valid = |tb: f64| tb >= min_valid && tb <= max_valid;
    let (mut tb_sum, mut tb_count, mut tb_min) = (0.0, 0usize, f64::INFINITY);
    let (mut weighted_y, mut weighted_x) = (0.0, 0.0);
    let (mut core_sum, mut core_count) = (0.0, 0usize);
    for &(y, x) in &corecold {
        let tb = frame.tb[[y, x]];
        if !valid(tb) {
            continue;
        }
        tb_sum += tb;
        tb_count += 1;
        tb_min = tb_min.min(tb);
        weighted_y += y as f64 * tb;
        weighted_x += x as f64 * tb;
        if tb < core_thresh {
            core_sum += tb;
            core_count += 1;
        }
    }
    if tb_count > 0 {
        record.min_tb = tb_min;
        record.mean_tb = tb_sum / tb_count as f64;
        record.y_weighted_center = weighted_y / tb_sum;
        record.x_weighted_center = weighted_x / tb_sum;
    }
    if core_count > 0 {
        record.core_mean_tb = core_sum / core_count as f64;
    }

    record
}

/// Radius of a disc with the given area
pub fn equivalent_radius(area: f64) -> f64 {
    (area / std::f64::consts::PI).sqrt()
}

/// Ellipse with the same second central moments as a pixel set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipse {
    /// Length of the major axis, in pixels
    pub major_axis: f64,
    /// Angle of the major axis from the x axis, degrees in (-90, 90]
    pub orientation: f64,
    pub eccentricity: f64,
}

impl Ellipse {
    pub fn fit(pixels: &[(usize, usize)], y_center: f64, x_center: f64) -> Self {
        let count = pixels.len() as f64;
        let (mut mu_xx, mut mu_yy, mut mu_xy) = (0.0, 0.0, 0.0);
        for &(y, x) in pixels {
            let dy = y as f64 - y_center;
            let dx = x as f64 - x_center;
            mu_xx += dx * dx;
            mu_yy += dy * dy;
            mu_xy += dx * dy;
        }
        // unit-square pixels add 1/12 to each axis variance
        let mu_xx = mu_xx / count + 1.0 / 12.0;
        let mu_yy = mu_yy / count + 1.0 / 12.0;
        let mu_xy = mu_xy / count;

        let half_trace = (mu_xx + mu_yy) / 2.0;
        let root = (((mu_xx - mu_yy) / 2.0).powi(2) + mu_xy * mu_xy).sqrt();
        let major = half_trace + root;
        let minor = (half_trace - root).max(0.0);

        Self {
            major_axis: 4.0 * major.sqrt(),
            orientation: 0.5 * (2.0 * mu_xy).atan2(mu_xx - mu_yy).to_degrees(),
            eccentricity: (1.0 - minor / major).max(0.0).sqrt(),
        }
    }
}

/// Pixels of the region with at least one 4-neighbour outside it
fn edge_pixels(
    region: &[(usize, usize)],
    cloud_number: i32,
    frame: &CloudIdFrame,
    cold_thresh: f64,
) -> usize {
    let (ny, nx) = frame.dim();
    let inside = |y: usize, x: usize| {
        frame.cloudnumber[[y, x]] == cloud_number && frame.tb[[y, x]] < cold_thresh
    };

    region
        .iter()
        .filter(|&&(y, x)| {
            y == 0
                || x == 0
                || y + 1 == ny
                || x + 1 == nx
                || !inside(y - 1, x)
                || !inside(y + 1, x)
                || !inside(y, x - 1)
                || !inside(y, x + 1)
        })
        .count()
}
