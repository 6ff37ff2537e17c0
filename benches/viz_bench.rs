//! Benchmarks for the visualization samplers and the audio-side engine.
//!
//! Run with: cargo bench
//!
//! The samplers run once per UI frame (~16ms budget). The engine and pool
//! handoff run inside the audio callback.
//!
//! Reference timing at 48kHz sample rate:
//!   - 256 samples  = 5.33ms deadline
//!   - 1024 samples = 21.33ms deadline
//!
//! Benchmark groups:
//!   - viz/*     Spectrum, trigger search, scope and lissajous scenes
//!   - engine/*  Router block rendering and the sample pool handoff

use criterion::{criterion_group, criterion_main};

mod engine;
mod viz;

/// Capture block sizes exercised by the engine benchmarks.
pub const BLOCK_SIZES: &[usize] = &[256, 512, 1024, 2048];

/// Canvas size of a typical terminal panel in braille dots.
pub const CANVAS: (f32, f32) = (240.0, 120.0);

/// Stereo test signal: a sine on the left, a quarter-period shifted copy on the right.
pub fn stereo_sine(len: usize, cycles: f32) -> (Vec<f32>, Vec<f32>) {
    let phase = |i: usize| i as f32 / len as f32 * cycles * std::f32::consts::TAU;
    let left = (0..len).map(|i| 0.8 * phase(i).sin()).collect();
    let right = (0..len).map(|i| 0.8 * phase(i).cos()).collect();
    (left, right)
}

criterion_group!(
    benches,
    // Per-frame samplers
    viz::bench_spectrum,
    viz::bench_scope,
    viz::bench_lissajous,
    // Audio callback side
    engine::bench_router,
    engine::bench_pool,
);
criterion_main!(benches);
