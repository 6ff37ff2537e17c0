//! Player - device setup and the render/input loop

use std::time::Duration;

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::DefaultTerminal;
use rtrb::RingBuffer;
use tracing::{info, warn};

use super::{stages::DeviceStages, ui};
use audviz::{
    capture::{CaptureHub, EnvelopeRecorder},
    config::PlayerConfig,
    engine::EngineBuilder,
    graph::{CaptureLayout, PlayerGraph, PlayerUnits, VisualizationMode},
    media::SourceSpec,
    params::{ParamBank, ParamEffect},
    playback::{AudioState, Pipeline},
    viz::{Analyser, FrameSources, VisualizationSession},
};

/// Frame period of the render loop (~60 fps).
const FRAME: Duration = Duration::from_millis(16);

/// Analyser tap capacity, in FFT frames.
const ANALYSER_RING_FRAMES: usize = 4;

pub struct Player {
    config: PlayerConfig,
    sample_rate: f32,
    stream: cpal::Stream,
    pipeline: Pipeline<DeviceStages>,
    hub: CaptureHub,
    analyser: Analyser,
    session: VisualizationSession,
    params: ParamBank,
    /// State shown last frame, for the event log.
    shown_state: Option<AudioState>,
    should_quit: bool,
}

impl Player {
    /// Open the output device and build the engine, graph and pipeline.
    pub fn new(config: PlayerConfig) -> EyreResult<Self> {
        let source: SourceSpec = config
            .source
            .as_deref()
            .ok_or_else(|| eyre!("no source given; pass a file path or \"mic\""))?
            .parse()?;

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let device_config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;
        let sample_rate = device_config.sample_rate().0 as f32;
        let channels = device_config.channels() as usize;

        let hub = CaptureHub::new();
        let (tap_tx, tap_rx) = RingBuffer::<f32>::new(config.fft_size * ANALYSER_RING_FRAMES);
        let mut builder = EngineBuilder::new(sample_rate);
        let units = PlayerUnits::build(
            &mut builder,
            &hub,
            tap_tx,
            config.block_size,
            config.gain,
            config.envelope_threshold,
            sample_rate,
        );
        let (patchbay, mut router) = builder.build();

        let layout = CaptureLayout {
            pool_size: config.pool_size,
            block_size: config.block_size,
            read_order: config.read_order,
            envelope_len: EnvelopeRecorder::window_len(
                config.envelope_window_seconds,
                sample_rate,
                config.block_size,
            ),
        };
        let graph = PlayerGraph::new(patchbay, units, hub.clone(), layout)?;

        let stream = device
            .build_output_stream(
                &device_config.into(),
                move |data: &mut [f32], _| router.process_interleaved(data, channels),
                |err| warn!("output stream error: {err}"),
                None,
            )
            .wrap_err("failed to build output stream")?;
        stream.play().wrap_err("failed to start output stream")?;
        info!(sample_rate, channels, "output stream running");

        let analyser = Analyser::new(
            config.fft_size,
            config.min_decibels,
            config.max_decibels,
            config.smoothing,
        )
        .with_input(tap_rx);
        let pipeline = Pipeline::new(
            DeviceStages::new(graph, config.mode),
            source,
            config.gesture_gated,
            config.loop_playback,
        );

        Ok(Self {
            session: VisualizationSession::new(config.mode, config.trigger_level),
            params: ParamBank::from_config(&config),
            config,
            sample_rate,
            stream,
            pipeline,
            hub,
            analyser,
            shown_state: None,
            should_quit: false,
        })
    }

    /// Bring the source up, then draw and handle keys until quit.
    pub fn run(mut self, mut terminal: DefaultTerminal) -> EyreResult<()> {
        // A failed start is shown in the UI; the user can still quit.
        let _ = self.pipeline.run();

        while !self.should_quit {
            self.poll_engine();

            terminal.draw(|frame| {
                let area = ui::visualization_area(frame.area());
                let (width, height) = ui::canvas_size(area);
                self.refresh_scene(width, height);
                ui::render(frame, &self.view());
            })?;

            if event::poll(FRAME)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        let stats = self.session.stats(&self.hub);
        let timings = *self.session.timings();
        info!(
            state = %self.pipeline.state(),
            frames = timings.frames(),
            peak_frame_ms = timings.peak().as_secs_f64() * 1_000.0,
            average_frame_ms = timings.average().as_secs_f64() * 1_000.0,
            blocks = stats.blocks,
            overruns = stats.overruns,
            underruns = stats.underruns,
            faults = stats.faults,
            stale = stats.stale,
            skipped_frames = stats.skipped_frames,
            envelope_samples = stats.envelope_samples,
            "playback finished"
        );
        drop(self.stream);
        Ok(())
    }

    fn poll_engine(&mut self) {
        let engine = self.pipeline.stages_mut().graph_mut().engine_mut();
        engine.reclaim();
        if engine.status().take_ended() {
            if let Err(err) = self.pipeline.ended() {
                warn!("end of source not handled: {err}");
            }
        }

        let state = self.pipeline.state();
        if self.shown_state != Some(state) {
            self.shown_state = Some(state);
            self.session.log(format!("State: {state}"));
            if state == AudioState::Ended {
                self.session.log_play_end();
            }
        }
    }

    fn refresh_scene(&mut self, width: f32, height: f32) {
        match self.pipeline.state() {
            AudioState::Failed => {
                let message = self
                    .pipeline
                    .last_error()
                    .unwrap_or("playback failed")
                    .to_owned();
                self.session.show_message(width, height, message);
            }
            AudioState::UserStartPlay => {
                self.session
                    .show_message(width, height, "press space to start playback");
            }
            state => {
                let mut sources = FrameSources {
                    hub: &self.hub,
                    analyser: &mut self.analyser,
                };
                self.session.render_in(state, &mut sources, width, height);
            }
        }
    }

    fn view(&self) -> ui::View<'_> {
        let engine = self.pipeline.stages().graph().engine();
        ui::View {
            source: self.pipeline.source(),
            state: self.pipeline.state(),
            mode: self.session.mode(),
            scene: self.session.last_scene(),
            param: self.params.selected(),
            stats: self.session.stats(&self.hub),
            sample_rate: self.sample_rate,
            looping: self.config.loop_playback,
            clock: engine.clock(),
            events: self.session.events(),
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char(' ') => self.play_pause(),
            KeyCode::Char(c @ '0'..='4') => {
                let mode = match c {
                    '1' => VisualizationMode::Spectrum,
                    '2' => VisualizationMode::Lissajous,
                    '3' => VisualizationMode::Oscilloscope,
                    '4' => VisualizationMode::Envelope,
                    _ => VisualizationMode::None,
                };
                self.set_mode(mode);
            }
            KeyCode::Tab => self.set_mode(self.session.mode().next()),
            KeyCode::Left => self.params.previous(),
            KeyCode::Right => self.params.next(),
            KeyCode::Up => self.adjust(1),
            KeyCode::Down => self.adjust(-1),
            _ => {}
        }
    }

    fn play_pause(&mut self) {
        let result = match self.pipeline.state() {
            AudioState::UserStartPlay => self.pipeline.play(),
            state if state.is_active() => self.pipeline.toggle(),
            AudioState::Ended | AudioState::Failed => {
                self.session.restart();
                self.pipeline.run()
            }
            state => Ok(state),
        };
        if let Err(err) = result {
            warn!("play/pause: {err}");
        }
    }

    fn set_mode(&mut self, mode: VisualizationMode) {
        self.pipeline.stages_mut().set_mode(mode);
        self.session.set_mode(mode);
    }

    fn adjust(&mut self, delta: i32) {
        let Some(effect) = self.params.adjust(delta) else {
            return;
        };
        let graph = self.pipeline.stages_mut().graph_mut();
        let units = *graph.units();
        let sent = match effect {
            ParamEffect::Gain(gain) => graph.engine_mut().set_gain(units.gain, gain),
            ParamEffect::EnvelopeThreshold(db) => {
                graph.engine_mut().set_threshold(units.compressor, db)
            }
            ParamEffect::NoiseFloor(db) => {
                self.analyser.set_min_decibels(db);
                Ok(())
            }
            ParamEffect::Smoothing(tau) => {
                self.analyser.set_smoothing(tau);
                Ok(())
            }
            ParamEffect::TriggerLevel(level) => {
                self.session.set_trigger_level(level);
                Ok(())
            }
        };
        if let Err(err) = sent {
            warn!(?effect, "parameter not applied: {err}");
        }
    }
}
