//! Benchmarks for the ping-pong sample pool handoff.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use audviz::buffer::{BufferPool, ReadOrder};

use crate::{stereo_sine, BLOCK_SIZES};

pub fn bench_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/pool");

    for &size in BLOCK_SIZES {
        let (left, right) = stereo_sine(size, 2.0);

        for order in [ReadOrder::Oldest, ReadOrder::Latest] {
            let mut pool = BufferPool::new(3, size, order);
            let id = format!("{order:?}/{size}");
            group.bench_with_input(BenchmarkId::new("produce_consume", id), &size, |b, _| {
                let mut t = 0.0;
                b.iter(|| {
                    t += 1.0;
                    pool.produce(black_box(&left), black_box(&right), t);
                    black_box(pool.consume_with(|slot| slot.left()[0]))
                })
            });
        }
    }

    group.finish();
}
