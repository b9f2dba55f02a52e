//! Benchmarks for the consolidation chain

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use trackstats::{
    consolidate, prune, resolve_status, Adjustor, CellRecord, ConsolidationConfig,
    FrameAssignment, FrameStats, TrackAccumulator, TrackStatsTable, FILL_VALUE,
};

/// `n_frames` frames where cell `c` belongs to track `(frame / 20) * n_cells + c + 1`,
/// so every track lives for 20 frames
fn create_test_frames(n_cells: usize, n_frames: usize) -> (Vec<FrameAssignment>, usize) {
    let frames = (0..n_frames)
        .map(|index| {
            let base = (index / 20) * n_cells;
            FrameAssignment {
                index,
                source_file: format!("cloudid_{:05}.json", index),
                track_of_cell: (0..n_cells).map(|c| (base + c + 1) as i32).collect(),
                status: vec![0; n_cells],
                merge_target: vec![FILL_VALUE; n_cells],
                split_source: vec![FILL_VALUE; n_cells],
                reset_flag: vec![0; n_cells],
            }
        })
        .collect();
    let num_tracks = n_frames.div_ceil(20) * n_cells;
    (frames, num_tracks)
}

fn synthetic_stats(frame: &FrameAssignment) -> anyhow::Result<Option<FrameStats>> {
    let mut stats = FrameStats::new(frame.index, "seconds since 1970-01-01 00:00:00");
    for (cell, track) in frame.assigned_cells() {
        stats.push(
            track,
            CellRecord {
                basetime: frame.index as f64 * 900.0,
                cloud_number: cell as i32 + 1,
                mean_lat: cell as f64 * 0.1,
                mean_lon: frame.index as f64 * 0.1,
                status: 0,
                ..Default::default()
            },
        );
    }
    Ok(Some(stats))
}

fn bench_consolidate(c: &mut Criterion) {
    let mut group = c.benchmark_group("consolidate");

    for &workers in &[1usize, 4] {
        let (frames, num_tracks) = create_test_frames(50, 200);
        let config = ConsolidationConfig {
            num_workers: workers,
            length_range: [2, 40],
            ..Default::default()
        };

        group.bench_with_input(
            BenchmarkId::new("workers", workers),
            &workers,
            |b, _| {
                b.iter(|| {
                    consolidate(black_box(&frames), num_tracks, &synthetic_stats, &config)
                        .unwrap()
                })
            },
        );
    }

    group.finish();
}

fn bench_single_threaded_stages(c: &mut Criterion) {
    let (frames, num_tracks) = create_test_frames(100, 200);
    let results: Vec<_> = frames
        .iter()
        .map(|frame| synthetic_stats(frame).unwrap())
        .collect();

    c.bench_function("accumulate_prune_renumber_100x200", |b| {
        b.iter_batched(
            || results.clone(),
            |results| {
                let mut acc = TrackAccumulator::new(num_tracks * 2, 40);
                acc.fold_all(results).unwrap();
                let (mut arena, compaction) = prune(acc.finish().arena);
                trackstats::renumber_links(&mut arena, &Adjustor::from_compaction(&compaction))
                    .unwrap();
                let statuses = resolve_status(&arena);
                TrackStatsTable::build(&arena, &statuses)
            },
            criterion::BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, bench_consolidate, bench_single_threaded_stages);
criterion_main!(benches);
