//! Benchmarks for the Lissajous point cloud.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use audviz::viz::{lissajous, PeakTracker};

use crate::{stereo_sine, BLOCK_SIZES, CANVAS};

pub fn bench_lissajous(c: &mut Criterion) {
    let mut group = c.benchmark_group("viz/lissajous");

    for &size in BLOCK_SIZES {
        let (left, right) = stereo_sine(size, 3.0);

        group.bench_with_input(BenchmarkId::new("scene", size), &size, |b, _| {
            b.iter(|| {
                let mut peak = PeakTracker::new(lissajous::LISSAJOUS_PEAK);
                black_box(lissajous::lissajous(
                    black_box(&left),
                    black_box(&right),
                    &mut peak,
                    CANVAS.0,
                    CANVAS.1,
                ))
            })
        });
    }

    group.finish();
}
