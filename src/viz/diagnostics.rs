//! Render-side diagnostics: per-frame render timing and a short event log
//! drawn over the visualization.

use std::collections::VecDeque;
use std::time::Duration;

use tracing::debug;

/// Lines the on-canvas log keeps before dropping the oldest.
pub const EVENT_LOG_LEN: usize = 12;

/// Running peak and average of frame render durations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameTimings {
    frames: u64,
    total: Duration,
    peak: Duration,
}

impl FrameTimings {
    pub fn record(&mut self, elapsed: Duration) {
        self.frames += 1;
        self.total += elapsed;
        self.peak = self.peak.max(elapsed);
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn peak(&self) -> Duration {
        self.peak
    }

    /// Zero until a frame has been recorded.
    pub fn average(&self) -> Duration {
        match u32::try_from(self.frames) {
            Ok(0) => Duration::ZERO,
            Ok(frames) => self.total / frames,
            Err(_) => Duration::from_secs_f64(self.total.as_secs_f64() / self.frames as f64),
        }
    }
}

/// Bounded list of recent events, oldest first.
#[derive(Debug, Clone)]
pub struct EventLog {
    lines: VecDeque<String>,
    capacity: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::with_capacity(EVENT_LOG_LEN)
    }
}

impl EventLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        debug!(event = %line, "event log");
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

/// Milliseconds with two decimals, for log lines.
pub fn millis(duration: Duration) -> String {
    format!("{:.2} ms", duration.as_secs_f64() * 1_000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timings_track_peak_and_average() {
        let mut timings = FrameTimings::default();
        assert_eq!(timings.average(), Duration::ZERO);

        for ms in [2, 6, 4] {
            timings.record(Duration::from_millis(ms));
        }
        assert_eq!(timings.frames(), 3);
        assert_eq!(timings.peak(), Duration::from_millis(6));
        assert_eq!(timings.average(), Duration::from_millis(4));
    }

    #[test]
    fn log_drops_oldest_line() {
        let mut log = EventLog::with_capacity(2);
        log.push("State: Init");
        log.push("State: Loading");
        log.push("State: Playing");

        assert_eq!(log.iter().collect::<Vec<_>>(), ["State: Loading", "State: Playing"]);
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn millis_formats_two_decimals() {
        assert_eq!(millis(Duration::from_micros(1_500)), "1.50 ms");
    }
}
