use std::time::Instant;

use tracing::{debug, info};

use super::{
    analyser::Analyser,
    diagnostics::{millis, EventLog, FrameTimings},
    envelope::{envelope, ENVELOPE_PEAK},
    lissajous::{lissajous, LISSAJOUS_PEAK},
    scope::{oscilloscope, SCOPE_PEAK},
    spectrum::{spectrum, SPECTRUM_PEAK},
    PeakTracker, Scene,
};
use crate::{
    capture::{CaptureHub, CaptureStats},
    graph::VisualizationMode,
    playback::AudioState,
};

/// What one render call produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A new scene was drawn from fresh data.
    Fresh,
    /// Nothing new arrived; the previous scene is shown again.
    Repeated,
    /// Data arrived but the scope found no trigger; the previous scene stays.
    Skipped,
    /// No visualization is active.
    Idle,
}

/// Everything a frame may read from.
pub struct FrameSources<'a> {
    pub hub: &'a CaptureHub,
    pub analyser: &'a mut Analyser,
}

/// Per-playback visualization state: the active mode, one auto-gain peak
/// per visualization, the scope trigger and the last scene drawn.
///
/// Captured data is copied into the session's own buffers while the capture
/// lock is held; drawing happens after it is released.
pub struct VisualizationSession {
    mode: VisualizationMode,
    spectrum_peak: PeakTracker,
    lissajous_peak: PeakTracker,
    scope_peak: PeakTracker,
    envelope_peak: PeakTracker,
    trigger_level: f32,
    last: Option<Scene>,
    last_outcome: FrameOutcome,
    skipped_frames: u64,
    left: Vec<f32>,
    right: Vec<f32>,
    trace: Vec<f32>,
    timings: FrameTimings,
    events: EventLog,
}

impl VisualizationSession {
    pub fn new(mode: VisualizationMode, trigger_level: f32) -> Self {
        Self {
            mode,
            spectrum_peak: PeakTracker::new(SPECTRUM_PEAK),
            lissajous_peak: PeakTracker::new(LISSAJOUS_PEAK),
            scope_peak: PeakTracker::new(SCOPE_PEAK),
            envelope_peak: PeakTracker::new(ENVELOPE_PEAK),
            trigger_level,
            last: None,
            last_outcome: FrameOutcome::Idle,
            skipped_frames: 0,
            left: Vec::new(),
            right: Vec::new(),
            trace: Vec::new(),
            timings: FrameTimings::default(),
            events: EventLog::default(),
        }
    }

    pub fn mode(&self) -> VisualizationMode {
        self.mode
    }

    /// Switch what is drawn. Peaks are kept so returning to a mode keeps its
    /// scale.
    pub fn set_mode(&mut self, mode: VisualizationMode) {
        if mode != self.mode {
            debug!(from = %self.mode, to = %mode, "session mode changed");
            self.events.push(format!("Mode: {mode}"));
            self.mode = mode;
            self.last = None;
            self.last_outcome = FrameOutcome::Idle;
        }
    }

    pub fn trigger_level(&self) -> f32 {
        self.trigger_level
    }

    pub fn set_trigger_level(&mut self, level: f32) {
        self.trigger_level = level;
    }

    /// Start over: peaks back to their initial values, counters cleared.
    pub fn restart(&mut self) {
        self.spectrum_peak.reset();
        self.lissajous_peak.reset();
        self.scope_peak.reset();
        self.envelope_peak.reset();
        self.last = None;
        self.last_outcome = FrameOutcome::Idle;
        self.skipped_frames = 0;
        self.timings = FrameTimings::default();
    }

    /// Replace the picture with a diagnostic or prompt.
    pub fn show_message(&mut self, width: f32, height: f32, message: impl Into<String>) {
        self.last = Some(Scene::with_message(width, height, message));
    }

    /// Draw a frame only while `state` is [`AudioState::Playing`]. In any
    /// other state nothing is consumed and the last scene stays up.
    pub fn render_in(
        &mut self,
        state: AudioState,
        sources: &mut FrameSources<'_>,
        width: f32,
        height: f32,
    ) -> Option<&Scene> {
        if state == AudioState::Playing {
            self.render_frame(sources, width, height)
        } else {
            self.last.as_ref()
        }
    }

    /// Draw one frame for the active mode.
    ///
    /// Returns the scene to display, which is the previous one when nothing
    /// new could be drawn.
    pub fn render_frame(
        &mut self,
        sources: &mut FrameSources<'_>,
        width: f32,
        height: f32,
    ) -> Option<&Scene> {
        let started = Instant::now();
        self.last_outcome = match self.mode {
            VisualizationMode::None => {
                self.last = None;
                FrameOutcome::Idle
            }
            VisualizationMode::Spectrum => self.render_spectrum(sources.analyser, width, height),
            VisualizationMode::Lissajous => self.render_lissajous(sources.hub, width, height),
            VisualizationMode::Oscilloscope => {
                self.render_oscilloscope(sources.hub, width, height)
            }
            VisualizationMode::Envelope => self.render_envelope(sources.hub, width, height),
        };
        self.timings.record(started.elapsed());
        self.last.as_ref()
    }

    pub fn render_spectrum(
        &mut self,
        analyser: &mut Analyser,
        width: f32,
        height: f32,
    ) -> FrameOutcome {
        let (min_db, max_db) = (analyser.min_decibels(), analyser.max_decibels());
        let decibels = analyser.update();
        self.last = Some(spectrum(
            decibels,
            min_db,
            max_db,
            &mut self.spectrum_peak,
            width,
            height,
        ));
        FrameOutcome::Fresh
    }

    pub fn render_lissajous(&mut self, hub: &CaptureHub, width: f32, height: f32) -> FrameOutcome {
        if !self.copy_block(hub) {
            return FrameOutcome::Repeated;
        }
        self.last = Some(lissajous(
            &self.left,
            &self.right,
            &mut self.lissajous_peak,
            width,
            height,
        ));
        FrameOutcome::Fresh
    }

    pub fn render_oscilloscope(
        &mut self,
        hub: &CaptureHub,
        width: f32,
        height: f32,
    ) -> FrameOutcome {
        if !self.copy_block(hub) {
            return FrameOutcome::Repeated;
        }
        let drawn = oscilloscope(
            &self.left,
            &self.right,
            self.trigger_level,
            &mut self.scope_peak,
            width,
            height,
        );
        match drawn {
            Some(scene) => {
                self.last = Some(scene);
                FrameOutcome::Fresh
            }
            None => {
                self.skipped_frames += 1;
                FrameOutcome::Skipped
            }
        }
    }

    pub fn render_envelope(&mut self, hub: &CaptureHub, width: f32, height: f32) -> FrameOutcome {
        let trace = &mut self.trace;
        let capacity = hub.with_recorder(|recorder| {
            let ring = recorder.ring();
            let unwritten = ring.capacity() - ring.len();
            trace.clear();
            trace.extend(ring.iter_chronological().skip(unwritten));
            ring.capacity()
        });
        let Some(capacity) = capacity else {
            return FrameOutcome::Repeated;
        };
        self.last = Some(envelope(
            self.trace.iter().copied(),
            capacity,
            &mut self.envelope_peak,
            width,
            height,
        ));
        FrameOutcome::Fresh
    }

    /// Copy the next pooled block into the session's buffers. The slot goes
    /// back to the pool before anything is drawn.
    fn copy_block(&mut self, hub: &CaptureHub) -> bool {
        let (left, right) = (&mut self.left, &mut self.right);
        hub.consume_with(|slot| {
            left.clear();
            left.extend_from_slice(slot.left());
            right.clear();
            right.extend_from_slice(slot.right());
        })
        .is_some()
    }

    /// Add a line to the on-canvas event log.
    pub fn log(&mut self, line: impl Into<String>) {
        self.events.push(line);
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn timings(&self) -> &FrameTimings {
        &self.timings
    }

    /// Report render timing for the playback that just ended.
    pub fn log_play_end(&mut self) {
        let (peak, average) = (self.timings.peak(), self.timings.average());
        info!(
            frames = self.timings.frames(),
            peak_ms = peak.as_secs_f64() * 1_000.0,
            average_ms = average.as_secs_f64() * 1_000.0,
            "play end"
        );
        self.events.push("Play end");
        self.events.push(format!("Peak frame: {}", millis(peak)));
        self.events.push(format!("Average frame: {}", millis(average)));
    }

    pub fn last_scene(&self) -> Option<&Scene> {
        self.last.as_ref()
    }

    pub fn last_outcome(&self) -> FrameOutcome {
        self.last_outcome
    }

    pub fn skipped_frames(&self) -> u64 {
        self.skipped_frames
    }

    pub fn peak(&self, mode: VisualizationMode) -> Option<f32> {
        match mode {
            VisualizationMode::None => None,
            VisualizationMode::Spectrum => Some(self.spectrum_peak.value()),
            VisualizationMode::Lissajous => Some(self.lissajous_peak.value()),
            VisualizationMode::Oscilloscope => Some(self.scope_peak.value()),
            VisualizationMode::Envelope => Some(self.envelope_peak.value()),
        }
    }

    /// Capture counters plus this session's skipped frames.
    pub fn stats(&self, hub: &CaptureHub) -> CaptureStats {
        CaptureStats {
            skipped_frames: self.skipped_frames,
            ..hub.stats()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ReadOrder;

    fn analyser() -> Analyser {
        Analyser::new(64, -110.0, -10.0, 0.3)
    }

    #[test]
    fn underrun_repeats_last_scene() {
        let hub = CaptureHub::new();
        hub.arm_pool(2, 4, ReadOrder::Oldest);
        let mut writer = hub.time_domain();
        let mut analyser = analyser();
        let mut session = VisualizationSession::new(VisualizationMode::Lissajous, 0.0);

        writer.on_block(&[0.1, 0.2, 0.3, 0.4], &[0.4, 0.3, 0.2, 0.1], 0.0);
        let mut sources = FrameSources {
            hub: &hub,
            analyser: &mut analyser,
        };
        let first = session.render_frame(&mut sources, 64.0, 64.0).cloned();
        assert_eq!(session.last_outcome(), FrameOutcome::Fresh);

        let second = session.render_frame(&mut sources, 64.0, 64.0).cloned();
        assert_eq!(session.last_outcome(), FrameOutcome::Repeated);
        assert_eq!(first, second);
        assert_eq!(session.stats(&hub).underruns, 1);
    }

    #[test]
    fn untriggered_scope_counts_skip() {
        let hub = CaptureHub::new();
        hub.arm_pool(2, 32, ReadOrder::Oldest);
        let mut writer = hub.time_domain();
        let mut analyser = analyser();
        let mut session = VisualizationSession::new(VisualizationMode::Oscilloscope, 0.5);

        writer.on_block(&[0.0; 32], &[0.0; 32], 0.0);
        let mut sources = FrameSources {
            hub: &hub,
            analyser: &mut analyser,
        };
        assert!(session.render_frame(&mut sources, 64.0, 64.0).is_none());
        assert_eq!(session.last_outcome(), FrameOutcome::Skipped);
        assert_eq!(session.stats(&hub).skipped_frames, 1);
    }

    #[test]
    fn spectrum_renders_every_frame() {
        let hub = CaptureHub::new();
        let mut analyser = analyser();
        analyser.push_samples(&[0.5; 64]);
        let mut session = VisualizationSession::new(VisualizationMode::Spectrum, 0.0);
        let mut sources = FrameSources {
            hub: &hub,
            analyser: &mut analyser,
        };

        let scene = session.render_frame(&mut sources, 16.0, 8.0).unwrap();
        assert_eq!(scene.shapes.len(), 16);
        assert!(session.peak(VisualizationMode::Spectrum).unwrap() >= SPECTRUM_PEAK);
    }

    #[test]
    fn envelope_reads_recorder() {
        let hub = CaptureHub::new();
        hub.arm_recorder(4);
        let mut writer = hub.envelope();
        for db in [-1.0, -2.0, -3.0] {
            writer.on_reduction(db);
        }
        let mut analyser = analyser();
        let mut session = VisualizationSession::new(VisualizationMode::Envelope, 0.0);
        let mut sources = FrameSources {
            hub: &hub,
            analyser: &mut analyser,
        };

        let scene = session.render_frame(&mut sources, 40.0, 10.0).unwrap();
        assert_eq!(scene.shapes.len(), 2);
        assert_eq!(session.peak(VisualizationMode::Envelope), Some(3.0));
    }

    #[test]
    fn mode_switch_keeps_peaks_and_restart_clears_them() {
        let hub = CaptureHub::new();
        hub.arm_pool(2, 2, ReadOrder::Oldest);
        hub.time_domain().on_block(&[0.8, 0.0], &[0.0, 0.0], 0.0);
        let mut analyser = analyser();
        let mut session = VisualizationSession::new(VisualizationMode::Lissajous, 0.0);
        session.render_frame(
            &mut FrameSources {
                hub: &hub,
                analyser: &mut analyser,
            },
            10.0,
            10.0,
        );

        session.set_mode(VisualizationMode::None);
        session.set_mode(VisualizationMode::Lissajous);
        assert_eq!(session.peak(VisualizationMode::Lissajous), Some(0.8));
        assert!(session.last_scene().is_none());

        session.restart();
        assert_eq!(session.peak(VisualizationMode::Lissajous), Some(LISSAJOUS_PEAK));
    }

    #[test]
    fn paused_session_holds_scene_and_leaves_blocks_pending() {
        let hub = CaptureHub::new();
        hub.arm_pool(2, 2, ReadOrder::Oldest);
        let mut writer = hub.time_domain();
        let mut analyser = analyser();
        let mut session = VisualizationSession::new(VisualizationMode::Lissajous, 0.0);
        let mut sources = FrameSources {
            hub: &hub,
            analyser: &mut analyser,
        };

        writer.on_block(&[0.5, 0.0], &[0.0, 0.5], 0.0);
        let playing = session
            .render_in(AudioState::Playing, &mut sources, 10.0, 10.0)
            .cloned();
        assert!(playing.is_some());

        writer.on_block(&[0.9, 0.0], &[0.0, 0.9], 1.0);
        for state in [AudioState::Paused, AudioState::Loading, AudioState::Ended] {
            let held = session.render_in(state, &mut sources, 10.0, 10.0).cloned();
            assert_eq!(held, playing);
        }
        assert_eq!(session.timings().frames(), 1);
        assert_eq!(hub.consume_with(|slot| slot.left()[0]), Some(0.9));
    }

    #[test]
    fn pooled_block_is_released_before_drawing() {
        let hub = CaptureHub::new();
        hub.arm_pool(1, 2, ReadOrder::Oldest);
        let mut writer = hub.time_domain();
        let mut session = VisualizationSession::new(VisualizationMode::Oscilloscope, 0.0);

        writer.on_block(&[0.8, -0.8], &[0.1, -0.1], 0.0);
        assert!(session.copy_block(&hub));
        assert_eq!(session.left, [0.8, -0.8]);
        assert_eq!(session.right, [0.1, -0.1]);

        // The only slot is free again while the copy is still undrawn.
        writer.on_block(&[0.2, 0.2], &[0.2, 0.2], 1.0);
        let stats = hub.stats();
        assert_eq!(stats.overruns, 0);
        assert_eq!(stats.blocks, 2);
    }

    #[test]
    fn play_end_reports_frame_timings() {
        let hub = CaptureHub::new();
        let mut analyser = analyser();
        analyser.push_samples(&[0.25; 64]);
        let mut session = VisualizationSession::new(VisualizationMode::Spectrum, 0.0);
        let mut sources = FrameSources {
            hub: &hub,
            analyser: &mut analyser,
        };
        session.render_frame(&mut sources, 16.0, 8.0);
        session.render_frame(&mut sources, 16.0, 8.0);
        assert_eq!(session.timings().frames(), 2);
        assert!(session.timings().peak() >= session.timings().average());

        session.set_mode(VisualizationMode::Envelope);
        session.log_play_end();
        let lines: Vec<&str> = session.events().iter().collect();
        assert_eq!(lines[0], "Mode: envelope");
        assert_eq!(lines[1], "Play end");
        assert!(lines[2].starts_with("Peak frame: "));
        assert!(lines[3].starts_with("Average frame: "));

        session.restart();
        assert_eq!(session.timings().frames(), 0);
        assert_eq!(session.events().len(), 4);
    }
}
