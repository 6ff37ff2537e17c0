use std::sync::{Arc, Mutex};

use super::{guarded, CaptureCounters, CaptureState};
use crate::buffer::RingBuffer;

/// Circular history of gain reduction, one value per audio block.
///
/// Values are stored negated so a compressor's negative dB reduction reads as
/// a positive-going trace. `running_min` tracks the raw (pre-negation) values.
pub struct EnvelopeRecorder {
    ring: RingBuffer<f32>,
    running_min: Option<f32>,
    appended: u64,
}

impl EnvelopeRecorder {
    pub fn new(len: usize) -> Self {
        Self {
            ring: RingBuffer::new(len),
            running_min: None,
            appended: 0,
        }
    }

    /// Number of blocks needed to cover `window_seconds` of audio.
    pub fn window_len(window_seconds: f32, sample_rate: f32, block_size: usize) -> usize {
        ((window_seconds * sample_rate) / block_size.max(1) as f32)
            .round()
            .max(1.0) as usize
    }

    pub fn append(&mut self, raw: f32) {
        self.ring.push(-raw);
        self.running_min = Some(self.running_min.map_or(raw, |m| m.min(raw)));
        self.appended += 1;
    }

    pub fn ring(&self) -> &RingBuffer<f32> {
        &self.ring
    }

    pub fn write_index(&self) -> usize {
        self.ring.write_index()
    }

    /// Smallest raw value appended so far.
    pub fn running_min(&self) -> Option<f32> {
        self.running_min
    }

    pub fn appended(&self) -> u64 {
        self.appended
    }
}

/// Audio-side writer feeding the envelope recorder.
pub struct EnvelopeCapture {
    state: Arc<Mutex<CaptureState>>,
    counters: Arc<CaptureCounters>,
}

impl EnvelopeCapture {
    pub(crate) fn new(state: Arc<Mutex<CaptureState>>, counters: Arc<CaptureCounters>) -> Self {
        Self { state, counters }
    }

    /// Record one gain-reduction reading (dB, normally <= 0).
    pub fn on_reduction(&mut self, reduction_db: f32) {
        guarded(&self.state, &self.counters, |state| {
            if let Some(recorder) = state.recorder.as_mut() {
                recorder.append(reduction_db);
            }
        });
    }
}
