//! Track statistics file
//!
//! Column-oriented JSON: run attributes, dimension sizes, and one entry per
//! variable holding its dimension names and row-major values. Missing floats
//! are written as `null`.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use trackstats::{Consolidation, FloatField, IntField, TextField, FILL_VALUE};

use crate::config::RunConfig;
use crate::error::Result;

const TRACK_DIMS: &[&str] = &["tracks"];
const STEP_DIMS: &[&str] = &["tracks", "times"];

/// Run-level attributes stored with the table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunAttributes {
    pub source: String,
    pub description: String,
    pub startdate: String,
    pub enddate: String,
    pub timegap: String,
    pub track_version: String,
    pub tracknumbers_version: String,
    pub pixel_radius_km: f64,
    pub area_thresh_km2: f64,
    pub cloudtb_threshs: [f64; 4],
    pub absolute_tb_threshs: [f64; 2],
    pub geolimits: [f64; 4],
    pub max_track_length: usize,
    pub basetime_units: String,
    pub original_tracks: usize,
    pub dropped_steps: usize,
    pub failed_frames: Vec<usize>,
    pub fill_value: i32,
}

impl RunAttributes {
    pub fn new(config: &RunConfig, result: &Consolidation) -> Self {
        let thresholds = &config.consolidation.thresholds;
        Self {
            source: config.datasource.clone(),
            description: config.datadescription.clone(),
            startdate: config.startdate.clone(),
            enddate: config.enddate.clone(),
            timegap: config.timegap.clone(),
            track_version: config.track_version.clone(),
            tracknumbers_version: config.tracknumbers_version.clone(),
            pixel_radius_km: thresholds.pixel_radius,
            area_thresh_km2: thresholds.area_thresh,
            cloudtb_threshs: thresholds.cloudtb_threshs,
            absolute_tb_threshs: thresholds.absolute_tb_threshs,
            geolimits: thresholds.geolimits,
            max_track_length: result.table.max_track_length(),
            basetime_units: result.basetime_units.clone().unwrap_or_default(),
            original_tracks: result.compaction.original_tracks(),
            dropped_steps: result.dropped_steps,
            failed_frames: result.failed_frames.clone(),
            fill_value: FILL_VALUE,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Variable {
    pub dims: Vec<String>,
    pub values: Value,
}

/// On-disk layout of a statistics file
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsFile {
    pub attributes: RunAttributes,
    pub dimensions: BTreeMap<String, usize>,
    pub variables: BTreeMap<String, Variable>,
}

impl StatsFile {
    pub fn new(attributes: RunAttributes, result: &Consolidation) -> Result<Self> {
        let table = &result.table;
        let mut variables = BTreeMap::new();

        let tracks = [
            ("length", table.length.view()),
            ("trackinterruptions", table.track_interruptions.view()),
            ("startstatus", table.start_status.view()),
            ("endstatus", table.end_status.view()),
        ];
        for (name, values) in tracks {
            variables.insert(name.to_string(), track_variable(values)?);
        }
        for field in FloatField::ALL {
            variables.insert(field.name().to_string(), step_variable(table.float(field))?);
        }
        for field in IntField::ALL {
            variables.insert(field.name().to_string(), step_variable(table.int(field))?);
        }
        for field in TextField::ALL {
            variables.insert(field.name().to_string(), step_variable(table.text(field))?);
        }

        let dimensions = BTreeMap::from([
            ("tracks".to_string(), table.num_tracks()),
            ("times".to_string(), table.max_track_length()),
        ]);

        Ok(Self {
            attributes,
            dimensions,
            variables,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }
}

fn track_variable(values: ArrayView1<'_, i32>) -> Result<Variable> {
    Ok(Variable {
        dims: TRACK_DIMS.iter().map(|d| d.to_string()).collect(),
        values: serde_json::to_value(values.to_vec())?,
    })
}

fn step_variable<T: Clone + Serialize>(values: ArrayView2<'_, T>) -> Result<Variable> {
    let rows: Vec<Vec<T>> = values.outer_iter().map(|row| row.to_vec()).collect();
    Ok(Variable {
        dims: STEP_DIMS.iter().map(|d| d.to_string()).collect(),
        values: serde_json::to_value(rows)?,
    })
}

/// Writes statistics files, replacing any previous output
pub struct StatsWriter {
    path: PathBuf,
}

impl StatsWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, attributes: RunAttributes, result: &Consolidation) -> Result<()> {
        let contents = StatsFile::new(attributes, result)?;

        if self.path.exists() {
            log::warn!("Replacing existing output {}", self.path.display());
            fs::remove_file(&self.path)?;
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer(writer, &contents)?;
        log::info!(
            "Wrote {} tracks to {}",
            result.table.num_tracks(),
            self.path.display()
        );
        Ok(())
    }
}
