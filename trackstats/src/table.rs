//! Dense `(tracks × max_track_length)` export of a consolidated arena
//!
//! Steps past a track's length hold the sentinel: NaN for floating-point
//! variables, [`FILL_VALUE`] for integers, an empty string for text.

use ndarray::prelude::*;
use rayon::prelude::*;

use crate::arena::TrackArena;
use crate::record::{CellRecord, FILL_VALUE};
use crate::status::StatusPair;

/// Floating-point per-step variables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatField {
    Basetime,
    MeanLat,
    MeanLon,
    MinLat,
    MinLon,
    MaxLat,
    MaxLon,
    Radius,
    RadiusWarmAnvil,
    MajorAxis,
    Orientation,
    Eccentricity,
    Perimeter,
    XCenter,
    YCenter,
    XWeightedCenter,
    YWeightedCenter,
    MinTb,
    MeanTb,
    CoreMeanTb,
}

impl FloatField {
    pub const ALL: [FloatField; 20] = [
        FloatField::Basetime,
        FloatField::MeanLat,
        FloatField::MeanLon,
        FloatField::MinLat,
        FloatField::MinLon,
        FloatField::MaxLat,
        FloatField::MaxLon,
        FloatField::Radius,
        FloatField::RadiusWarmAnvil,
        FloatField::MajorAxis,
        FloatField::Orientation,
        FloatField::Eccentricity,
        FloatField::Perimeter,
        FloatField::XCenter,
        FloatField::YCenter,
        FloatField::XWeightedCenter,
        FloatField::YWeightedCenter,
        FloatField::MinTb,
        FloatField::MeanTb,
        FloatField::CoreMeanTb,
    ];

    /// Variable name in the statistics file
    pub fn name(self) -> &'static str {
        match self {
            FloatField::Basetime => "basetime",
            FloatField::MeanLat => "meanlat",
            FloatField::MeanLon => "meanlon",
            FloatField::MinLat => "minlat",
            FloatField::MinLon => "minlon",
            FloatField::MaxLat => "maxlat",
            FloatField::MaxLon => "maxlon",
            FloatField::Radius => "radius",
            FloatField::RadiusWarmAnvil => "radius_warmanvil",
            FloatField::MajorAxis => "majoraxis",
            FloatField::Orientation => "orientation",
            FloatField::Eccentricity => "eccentricity",
            FloatField::Perimeter => "perimeter",
            FloatField::XCenter => "xcenter",
            FloatField::YCenter => "ycenter",
            FloatField::XWeightedCenter => "xcenter_weighted",
            FloatField::YWeightedCenter => "ycenter_weighted",
            FloatField::MinTb => "mintb",
            FloatField::MeanTb => "meantb",
            FloatField::CoreMeanTb => "meantb_conv",
        }
    }

    pub fn get(self, cell: &CellRecord) -> f64 {
        match self {
            FloatField::Basetime => cell.basetime,
            FloatField::MeanLat => cell.mean_lat,
            FloatField::MeanLon => cell.mean_lon,
            FloatField::MinLat => cell.min_lat,
            FloatField::MinLon => cell.min_lon,
            FloatField::MaxLat => cell.max_lat,
            FloatField::MaxLon => cell.max_lon,
            FloatField::Radius => cell.radius,
            FloatField::RadiusWarmAnvil => cell.radius_warm_anvil,
            FloatField::MajorAxis => cell.major_axis,
            FloatField::Orientation => cell.orientation,
            FloatField::Eccentricity => cell.eccentricity,
            FloatField::Perimeter => cell.perimeter,
            FloatField::XCenter => cell.x_center,
            FloatField::YCenter => cell.y_center,
            FloatField::XWeightedCenter => cell.x_weighted_center,
            FloatField::YWeightedCenter => cell.y_weighted_center,
            FloatField::MinTb => cell.min_tb,
            FloatField::MeanTb => cell.mean_tb,
            FloatField::CoreMeanTb => cell.core_mean_tb,
        }
    }
}

/// Integer per-step variables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntField {
    CloudNumber,
    NCoreCold,
    NCore,
    NCold,
    NWarm,
    Boundary,
    Status,
    MergeTarget,
    SplitSource,
}

impl IntField {
    pub const ALL: [IntField; 9] = [
        IntField::CloudNumber,
        IntField::NCoreCold,
        IntField::NCore,
        IntField::NCold,
        IntField::NWarm,
        IntField::Boundary,
        IntField::Status,
        IntField::MergeTarget,
        IntField::SplitSource,
    ];

    pub fn name(self) -> &'static str {
        match self {
            IntField::CloudNumber => "cloudnumber",
            IntField::NCoreCold => "npix",
            IntField::NCore => "nconv",
            IntField::NCold => "ncoldanvil",
            IntField::NWarm => "nwarmanvil",
            IntField::Boundary => "boundary",
            IntField::Status => "status",
            IntField::MergeTarget => "mergenumbers",
            IntField::SplitSource => "splitnumbers",
        }
    }

    pub fn get(self, cell: &CellRecord) -> i32 {
        match self {
            IntField::CloudNumber => cell.cloud_number,
            IntField::NCoreCold => cell.n_core_cold,
            IntField::NCore => cell.n_core,
            IntField::NCold => cell.n_cold,
            IntField::NWarm => cell.n_warm,
            IntField::Boundary => cell.boundary,
            IntField::Status => cell.status,
            IntField::MergeTarget => cell.merge_target,
            IntField::SplitSource => cell.split_source,
        }
    }
}

/// Text per-step variables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    SourceFile,
    Datetime,
}

impl TextField {
    pub const ALL: [TextField; 2] = [TextField::SourceFile, TextField::Datetime];

    pub fn name(self) -> &'static str {
        match self {
            TextField::SourceFile => "cloudidfiles",
            TextField::Datetime => "datetimestrings",
        }
    }

    pub fn get(self, cell: &CellRecord) -> &str {
        match self {
            TextField::SourceFile => &cell.source_file,
            TextField::Datetime => &cell.datetime,
        }
    }
}

/// Final per-track statistics in dense form
#[derive(Debug, Clone)]
pub struct TrackStatsTable {
    max_track_length: usize,
    /// Recorded steps per track
    pub length: Array1<i32>,
    pub track_interruptions: Array1<i32>,
    pub start_status: Array1<i32>,
    pub end_status: Array1<i32>,
    floats: Vec<Array2<f64>>,
    ints: Vec<Array2<i32>>,
    texts: Vec<Array2<String>>,
}

impl TrackStatsTable {
    /// Lay out `arena` densely. `statuses` must come from the same arena.
    pub fn build(arena: &TrackArena, statuses: &[StatusPair]) -> Self {
        let shape = (arena.num_tracks(), arena.max_track_length());

        let floats = FloatField::ALL
            .par_iter()
            .map(|&field| dense_column(arena, shape, f64::NAN, |cell| field.get(cell)))
            .collect();
        let ints = IntField::ALL
            .par_iter()
            .map(|&field| dense_column(arena, shape, FILL_VALUE, |cell| field.get(cell)))
            .collect();
        let texts = TextField::ALL
            .par_iter()
            .map(|&field| {
                dense_column(arena, shape, String::new(), |cell| {
                    field.get(cell).to_string()
                })
            })
            .collect();

        Self {
            max_track_length: shape.1,
            length: arena.iter().map(|(_, r)| r.len() as i32).collect(),
            track_interruptions: arena
                .iter()
                .map(|(_, r)| r.track_interruptions())
                .collect(),
            start_status: statuses.iter().map(|s| s.start).collect(),
            end_status: statuses.iter().map(|s| s.end).collect(),
            floats,
            ints,
            texts,
        }
    }

    pub fn num_tracks(&self) -> usize {
        self.length.len()
    }

    pub fn max_track_length(&self) -> usize {
        self.max_track_length
    }

    pub fn is_empty(&self) -> bool {
        self.length.is_empty()
    }

    pub fn float(&self, field: FloatField) -> ArrayView2<'_, f64> {
        self.floats[field as usize].view()
    }

    pub fn int(&self, field: IntField) -> ArrayView2<'_, i32> {
        self.ints[field as usize].view()
    }

    pub fn text(&self, field: TextField) -> ArrayView2<'_, String> {
        self.texts[field as usize].view()
    }
}

fn dense_column<T, F>(arena: &TrackArena, shape: (usize, usize), fill: T, get: F) -> Array2<T>
where
    T: Clone,
    F: Fn(&CellRecord) -> T,
{
    let mut column = Array2::from_elem(shape, fill);
    for (row, (_, record)) in arena.iter().enumerate() {
        for (step, cell) in record.steps().iter().enumerate() {
            column[[row, step]] = get(cell);
        }
    }
    column
}
