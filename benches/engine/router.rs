//! Benchmarks for rendering the full player graph in the audio callback.

use std::{hint::black_box, sync::Arc};

use criterion::{BenchmarkId, Criterion};
use audviz::{
    buffer::ReadOrder,
    capture::CaptureHub,
    engine::{source::BufferPlayer, EngineBuilder, SourceFeed},
    graph::{CaptureLayout, PlayerGraph, PlayerUnits, VisualizationMode},
    media::DecodedAudio,
};
use rtrb::RingBuffer;

use crate::{stereo_sine, BLOCK_SIZES};

const SAMPLE_RATE: f32 = 48_000.0;

pub fn bench_router(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/router");
    let (left, right) = stereo_sine(SAMPLE_RATE as usize * 10, 4400.0);
    let audio = Arc::new(DecodedAudio {
        sample_rate: SAMPLE_RATE as u32,
        left,
        right,
    });

    for mode in [
        VisualizationMode::None,
        VisualizationMode::Spectrum,
        VisualizationMode::Oscilloscope,
        VisualizationMode::Envelope,
    ] {
        for &size in BLOCK_SIZES {
            let hub = CaptureHub::new();
            let (tap_tx, mut tap_rx) = RingBuffer::<f32>::new(8192);
            let mut builder = EngineBuilder::new(SAMPLE_RATE);
            let units =
                PlayerUnits::build(&mut builder, &hub, tap_tx, size, 1.0, -24.0, SAMPLE_RATE);
            let (patchbay, mut router) = builder.build();
            let layout = CaptureLayout {
                pool_size: 2,
                block_size: size,
                read_order: ReadOrder::Oldest,
                envelope_len: 4096,
            };
            let Ok(mut graph) = PlayerGraph::new(patchbay, units, hub.clone(), layout) else {
                continue;
            };
            if graph.set_visualization(mode).is_err() {
                continue;
            }
            let player = BufferPlayer::new(audio.clone(), SAMPLE_RATE);
            let _ = graph.engine_mut().set_source(SourceFeed::Buffer(player));
            let _ = graph.engine_mut().set_playing(true);
            router.apply_messages();

            let id = format!("{}/{}", mode, size);
            group.bench_with_input(BenchmarkId::new("render_block", id), &size, |b, &size| {
                b.iter(|| {
                    black_box(router.render_block(size));
                    // Keep the pool and tap from saturating.
                    hub.consume_with(|slot| slot.timestamp());
                    while tap_rx.pop().is_ok() {}
                })
            });
        }
    }

    group.finish();
}
