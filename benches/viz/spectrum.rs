//! Benchmarks for the analyser FFT and spectrum bar layout.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use audviz::viz::{spectrum, Analyser, PeakTracker};

use crate::{stereo_sine, CANVAS};

pub fn bench_spectrum(c: &mut Criterion) {
    let mut group = c.benchmark_group("viz/spectrum");

    for fft_size in [1024, 2048, 4096] {
        let (signal, _) = stereo_sine(fft_size, 37.0);
        let mut analyser = Analyser::new(fft_size, -110.0, -10.0, 0.3);
        analyser.push_samples(&signal);

        group.bench_with_input(BenchmarkId::new("analyse", fft_size), &fft_size, |b, _| {
            b.iter(|| {
                black_box(analyser.analyse());
            })
        });

        let decibels = analyser.decibels().to_vec();
        group.bench_with_input(BenchmarkId::new("bars", fft_size), &fft_size, |b, _| {
            b.iter(|| {
                let mut peak = PeakTracker::new(spectrum::SPECTRUM_PEAK);
                black_box(spectrum::spectrum(
                    black_box(&decibels),
                    -110.0,
                    -10.0,
                    &mut peak,
                    CANVAS.0,
                    CANVAS.1,
                ))
            })
        });
    }

    group.finish();
}
