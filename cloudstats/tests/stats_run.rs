//! Full runs over a small synthetic tracking dataset

use std::fs;
use std::path::Path;

use approx::assert_abs_diff_eq;
use cloudstats::{RunConfig, StatsError, StatsFile, StatsRunner, TrackingMatrix};
use serde_json::json;
use trackstats::{ConsolidationConfig, FILL_VALUE};

const START: f64 = 1305590400.0;

/// 4x4 grid with cloud 1 in the top-left block and cloud 2 in the bottom-right
fn write_cloudid(dir: &Path, name: &str, basetime: f64) {
    let value = json!({
        "basetime": basetime,
        "basetime_units": "seconds since 1970-01-01 00:00:00",
        "latitude": [[0.0, 0.0, 0.0, 0.0], [1.0, 1.0, 1.0, 1.0], [2.0, 2.0, 2.0, 2.0], [3.0, 3.0, 3.0, 3.0]],
        "longitude": [[0.0, 1.0, 2.0, 3.0], [0.0, 1.0, 2.0, 3.0], [0.0, 1.0, 2.0, 3.0], [0.0, 1.0, 2.0, 3.0]],
        "cloudnumber": [[1, 1, 0, 0], [1, 1, 0, 0], [0, 0, 2, 2], [0, 0, 2, 2]],
        "tb": [[200.0, 210.0, 290.0, 290.0], [220.0, 230.0, 290.0, 290.0], [290.0, 290.0, 235.0, 235.0], [290.0, 290.0, 235.0, 235.0]],
    });
    fs::write(dir.join(name), value.to_string()).unwrap();
}

/// Four frames of three tracks. Track 2 is never observed; track 1 merges
/// into track 3 in the third frame.
fn write_dataset(root: &Path) -> RunConfig {
    let tracking = root.join("tracking");
    let stats = root.join("stats");
    fs::create_dir_all(&tracking).unwrap();
    fs::create_dir_all(&stats).unwrap();

    let files: Vec<String> = (0..4).map(|f| format!("cloudid_{}.json", f)).collect();
    for (f, name) in files.iter().enumerate() {
        write_cloudid(&tracking, name, START + f as f64 * 1800.0);
    }

    let matrix = TrackingMatrix {
        ntracks: 3,
        cloudid_files: files,
        track_numbers: vec![vec![1, 3], vec![1, 3], vec![1, 3], vec![0, 3]],
        track_status: vec![vec![0, 0], vec![0, 0], vec![13, 0], vec![0, 4]],
        track_mergenumbers: vec![
            vec![FILL_VALUE, FILL_VALUE],
            vec![FILL_VALUE, FILL_VALUE],
            vec![3, FILL_VALUE],
            vec![FILL_VALUE, FILL_VALUE],
        ],
        track_splitnumbers: vec![vec![FILL_VALUE, FILL_VALUE]; 4],
        track_reset: vec![vec![0, 0]; 4],
    };

    let config = RunConfig {
        startdate: "20110517.0000".to_string(),
        enddate: "20110517.0130".to_string(),
        tracking_inpath: tracking,
        stats_path: stats,
        consolidation: ConsolidationConfig {
            num_workers: 2,
            length_range: [2, 6],
            ..Default::default()
        },
        ..Default::default()
    };
    fs::write(
        config.tracking_matrix_path(),
        serde_json::to_string(&matrix).unwrap(),
    )
    .unwrap();
    config
}

#[test]
fn test_full_run_writes_renumbered_tracks() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let config = write_dataset(dir.path());
    let expected_output = config.output_path();

    let summary = StatsRunner::new(config).unwrap().run().unwrap();
    assert_eq!(summary.output, expected_output);
    assert_eq!(summary.num_tracks, 2);
    assert_eq!(summary.original_tracks, 3);
    assert!(summary.failed_frames.is_empty());

    let file = StatsFile::from_file(&expected_output).unwrap();
    assert_eq!(file.dimensions["tracks"], 2);
    assert_eq!(file.dimensions["times"], 6);
    assert_eq!(file.variables["length"].values, json!([3, 4]));
    assert_eq!(file.variables["startstatus"].values, json!([0, 0]));
    assert_eq!(file.variables["endstatus"].values, json!([13, 4]));

    // old track 3 is now track 2
    let merges = &file.variables["mergenumbers"].values;
    assert_eq!(merges[0][2], json!(2));
    assert_eq!(merges[1][0], json!(FILL_VALUE));

    let datetimes = &file.variables["datetimestrings"].values;
    assert_eq!(datetimes[0][0], json!("20110517_0000"));
    assert_eq!(datetimes[1][3], json!("20110517_0130"));
    assert_eq!(datetimes[0][3], json!(""));

    let npix = &file.variables["npix"].values;
    assert_eq!(npix[0][0], json!(4));
    let meanlat = file.variables["meanlat"].values[1][0].as_f64().unwrap();
    assert_abs_diff_eq!(meanlat, 2.5);
    assert!(file.variables["meanlat"].values[0][5].is_null());
}

#[test]
fn test_run_survives_missing_frame_file() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let config = write_dataset(dir.path());
    fs::remove_file(config.tracking_inpath.join("cloudid_1.json")).unwrap();
    let output = dir.path().join("out").join("stats.json");

    let summary = StatsRunner::new(config)
        .unwrap()
        .with_output(&output)
        .run()
        .unwrap();
    assert_eq!(summary.failed_frames, vec![1]);
    assert_eq!(summary.num_tracks, 2);

    let file = StatsFile::from_file(&output).unwrap();
    assert_eq!(file.variables["length"].values, json!([2, 3]));
    assert_eq!(file.attributes.failed_frames, vec![1]);
    let basetime = &file.variables["basetime"].values;
    assert_abs_diff_eq!(basetime[1][1].as_f64().unwrap(), START + 3600.0);
}

#[test]
fn test_foreign_cloudid_file_names_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = write_dataset(dir.path());
    config.cloudid_filebase = "mcs_".to_string();
    let err = StatsRunner::new(config).unwrap().run().unwrap_err();
    assert!(matches!(err, StatsError::TrackingMatrixError(_)));
}

#[test]
fn test_missing_tracking_matrix() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = write_dataset(dir.path());
    config.tracknumbers_filebase = "other".to_string();
    let err = StatsRunner::new(config).unwrap().run().unwrap_err();
    assert!(matches!(err, StatsError::IoError(_)));
}
