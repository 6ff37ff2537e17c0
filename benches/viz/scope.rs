//! Benchmarks for trigger search and the oscilloscope trace.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use audviz::viz::{find_trigger_level, scope, PeakTracker};

use crate::{stereo_sine, BLOCK_SIZES, CANVAS};

pub fn bench_scope(c: &mut Criterion) {
    let mut group = c.benchmark_group("viz/scope");

    for &size in BLOCK_SIZES {
        let (left, right) = stereo_sine(size, 4.0);

        group.bench_with_input(BenchmarkId::new("trigger", size), &size, |b, _| {
            b.iter(|| find_trigger_level(black_box(0.0), black_box(&left)))
        });

        // No crossing at this level, so the whole block is scanned.
        group.bench_with_input(BenchmarkId::new("trigger_miss", size), &size, |b, _| {
            b.iter(|| find_trigger_level(black_box(0.95), black_box(&left)))
        });

        group.bench_with_input(BenchmarkId::new("trace", size), &size, |b, _| {
            b.iter(|| {
                let mut peak = PeakTracker::new(scope::SCOPE_PEAK);
                black_box(scope::oscilloscope(
                    black_box(&left),
                    black_box(&right),
                    0.0,
                    &mut peak,
                    CANVAS.0,
                    CANVAS.1,
                ))
            })
        });
    }

    group.finish();
}
