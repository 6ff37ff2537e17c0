//! Device-free playback: the real engine, graph and samplers, driven by
//! calling the output callback directly.

use std::sync::Arc;

use audviz::{
    buffer::ReadOrder,
    capture::CaptureHub,
    engine::{source::BufferPlayer, EngineBuilder, Patchbay, Router, SourceFeed},
    graph::{CaptureLayout, PlayerGraph, PlayerUnits, VisualizationMode},
    media::DecodedAudio,
    viz::{Analyser, FrameOutcome, FrameSources, Shape, VisualizationSession},
};
use rtrb::{Consumer, RingBuffer};

const SAMPLE_RATE: f32 = 48_000.0;
const BLOCK: usize = 256;
const WIDTH: f32 = 200.0;
const HEIGHT: f32 = 100.0;

struct Rig {
    graph: PlayerGraph<Patchbay>,
    router: Router,
    hub: CaptureHub,
    tap: Option<Consumer<f32>>,
}

fn sine(frames: usize, amplitude: f32) -> DecodedAudio {
    let phase = |i: usize| i as f32 * 440.0 / SAMPLE_RATE * std::f32::consts::TAU;
    DecodedAudio {
        sample_rate: SAMPLE_RATE as u32,
        left: (0..frames).map(|i| amplitude * phase(i).sin()).collect(),
        right: (0..frames).map(|i| amplitude * phase(i).cos()).collect(),
    }
}

fn rig(mode: VisualizationMode, audio: DecodedAudio) -> Rig {
    let hub = CaptureHub::new();
    let (tap_tx, tap_rx) = RingBuffer::<f32>::new(8192);
    let mut builder = EngineBuilder::new(SAMPLE_RATE);
    let units = PlayerUnits::build(&mut builder, &hub, tap_tx, BLOCK, 1.0, -24.0, SAMPLE_RATE);
    let (patchbay, router) = builder.build();
    let layout = CaptureLayout {
        pool_size: 2,
        block_size: BLOCK,
        read_order: ReadOrder::Oldest,
        envelope_len: 64,
    };
    let mut graph = PlayerGraph::new(patchbay, units, hub.clone(), layout).unwrap();
    graph.set_visualization(mode).unwrap();

    let player = BufferPlayer::new(Arc::new(audio), SAMPLE_RATE);
    graph
        .engine_mut()
        .set_source(SourceFeed::Buffer(player))
        .unwrap();
    graph.engine_mut().set_playing(true).unwrap();

    Rig {
        graph,
        router,
        hub,
        tap: Some(tap_rx),
    }
}

/// Run the output callback for `frames` stereo frames.
fn render(router: &mut Router, frames: usize) -> Vec<f32> {
    let mut data = vec![0.0; frames * 2];
    router.process_interleaved(&mut data, 2);
    data
}

#[test]
fn audible_path_plays_the_source_unchanged() {
    let audio = sine(4096, 0.5);
    let expected = audio.left[..BLOCK].to_vec();
    let mut rig = rig(VisualizationMode::None, audio);

    let out = render(&mut rig.router, BLOCK);
    for (i, want) in expected.iter().enumerate() {
        assert!((out[2 * i] - want).abs() < 1e-6, "frame {i}");
    }
    assert_eq!(rig.graph.engine().status().frames(), BLOCK as u64);
}

#[test]
fn oscilloscope_draws_two_traces_from_the_pool() {
    let mut rig = rig(VisualizationMode::Oscilloscope, sine(48_000, 0.8));
    let mut analyser = Analyser::new(1024, -110.0, -10.0, 0.3);
    let mut session = VisualizationSession::new(VisualizationMode::Oscilloscope, 0.0);

    render(&mut rig.router, BLOCK * 2);
    let mut sources = FrameSources {
        hub: &rig.hub,
        analyser: &mut analyser,
    };
    let scene = session.render_frame(&mut sources, WIDTH, HEIGHT).unwrap();

    assert!(scene
        .shapes
        .iter()
        .any(|s| matches!(s, Shape::Line { y1, .. } if *y1 < HEIGHT / 2.0)));
    assert!(scene
        .shapes
        .iter()
        .any(|s| matches!(s, Shape::Line { y1, .. } if *y1 > HEIGHT / 2.0)));
    assert_eq!(session.last_outcome(), FrameOutcome::Fresh);

    let stats = session.stats(&rig.hub);
    assert_eq!(stats.blocks, 2);
    assert_eq!(stats.faults, 0);
}

#[test]
fn lissajous_scales_to_the_loudest_sample() {
    let mut rig = rig(VisualizationMode::Lissajous, sine(48_000, 0.8));
    let mut analyser = Analyser::new(1024, -110.0, -10.0, 0.3);
    let mut session = VisualizationSession::new(VisualizationMode::Lissajous, 0.0);

    render(&mut rig.router, BLOCK);
    let mut sources = FrameSources {
        hub: &rig.hub,
        analyser: &mut analyser,
    };
    assert!(session.render_frame(&mut sources, WIDTH, HEIGHT).is_some());
    let peak = session.peak(VisualizationMode::Lissajous).unwrap();
    assert!(peak > 0.7 && peak <= 0.8, "peak {peak}");

    // Nothing new captured: the frame repeats.
    session.render_frame(&mut sources, WIDTH, HEIGHT);
    assert_eq!(session.last_outcome(), FrameOutcome::Repeated);
    assert_eq!(rig.hub.stats().underruns, 1);
}

#[test]
fn spectrum_reads_the_analyser_tap() {
    let mut rig = rig(VisualizationMode::Spectrum, sine(48_000, 0.8));
    let tap = rig.tap.take().unwrap();
    let mut analyser = Analyser::new(1024, -110.0, -10.0, 0.3).with_input(tap);
    let mut session = VisualizationSession::new(VisualizationMode::Spectrum, 0.0);

    render(&mut rig.router, 2048);
    let mut sources = FrameSources {
        hub: &rig.hub,
        analyser: &mut analyser,
    };
    let scene = session.render_frame(&mut sources, WIDTH, HEIGHT).unwrap();

    assert!(scene
        .shapes
        .iter()
        .any(|s| matches!(s, Shape::Rect { height, .. } if *height > 0.0)));
    // The pool is not armed for the spectrum.
    assert!(!rig.hub.is_pool_armed());
}

#[test]
fn envelope_records_compressor_reduction() {
    let mut rig = rig(VisualizationMode::Envelope, sine(48_000, 0.8));
    let mut analyser = Analyser::new(1024, -110.0, -10.0, 0.3);
    let mut session = VisualizationSession::new(VisualizationMode::Envelope, 0.0);

    render(&mut rig.router, BLOCK * 8);
    assert_eq!(rig.hub.stats().envelope_samples, 8);
    let reduced = rig
        .hub
        .with_recorder(|recorder| recorder.running_min())
        .flatten()
        .unwrap();
    assert!(reduced < 0.0, "no gain reduction recorded: {reduced}");

    let mut sources = FrameSources {
        hub: &rig.hub,
        analyser: &mut analyser,
    };
    let scene = session.render_frame(&mut sources, WIDTH, HEIGHT).unwrap();
    assert!(!scene.shapes.is_empty());
}

#[test]
fn exhausted_source_reports_end_once_and_goes_silent() {
    let mut rig = rig(VisualizationMode::None, sine(300, 0.5));

    let out = render(&mut rig.router, 1024);
    assert!(rig.graph.engine().status().take_ended());
    assert!(!rig.graph.engine().status().take_ended());
    assert!(out[2 * 400..].iter().all(|&s| s == 0.0));

    let out = render(&mut rig.router, BLOCK);
    assert!(out.iter().all(|&s| s == 0.0));
    assert!(!rig.router.is_playing());
}

#[test]
fn switching_modes_keeps_audio_flowing() {
    let mut rig = rig(VisualizationMode::Spectrum, sine(48_000, 0.5));
    for mode in [
        VisualizationMode::Oscilloscope,
        VisualizationMode::Envelope,
        VisualizationMode::None,
        VisualizationMode::Lissajous,
    ] {
        rig.graph.set_visualization(mode).unwrap();
        let out = render(&mut rig.router, BLOCK);
        assert!(out.iter().any(|&s| s.abs() > 0.1), "silent after switching to {mode}");
    }
}
