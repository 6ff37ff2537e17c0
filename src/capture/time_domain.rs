use std::sync::{Arc, Mutex};

use super::{guarded, CaptureCounters, CaptureState};

/// Audio-side writer for stereo blocks.
///
/// Called once per fixed-size block by the capture processor unit. The
/// channel slices are only valid for the duration of the call, so the pool
/// copies them.
pub struct TimeDomainCapture {
    state: Arc<Mutex<CaptureState>>,
    counters: Arc<CaptureCounters>,
}

impl TimeDomainCapture {
    pub(crate) fn new(state: Arc<Mutex<CaptureState>>, counters: Arc<CaptureCounters>) -> Self {
        Self { state, counters }
    }

    pub fn on_block(&mut self, left: &[f32], right: &[f32], timestamp: f64) {
        guarded(&self.state, &self.counters, |state| {
            if let Some(pool) = state.pool.as_mut() {
                // A full pool counts its own overrun.
                pool.produce(left, right, timestamp);
            }
        });
    }
}
