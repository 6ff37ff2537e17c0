/// High-water mark used as a visualization's auto-gain.
///
/// Only ever grows while a session runs, so the picture never jumps back up
/// after a loud passage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakTracker {
    initial: f32,
    value: f32,
}

impl PeakTracker {
    pub fn new(initial: f32) -> Self {
        Self {
            initial,
            value: initial,
        }
    }

    /// Raise the peak to `candidate` if it is larger. Non-finite values are ignored.
    pub fn observe(&mut self, candidate: f32) {
        if candidate.is_finite() && candidate > self.value {
            self.value = candidate;
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Back to the initial value. Only for an explicit session restart.
    pub fn reset(&mut self) {
        self.value = self.initial;
    }
}
