use std::sync::Arc;

use rtrb::Consumer;

use crate::media::DecodedAudio;

/// What the source unit plays.
pub enum SourceFeed {
    Silent,
    /// A fully decoded file, played once from the start.
    Buffer(BufferPlayer),
    /// Live stereo frames pushed by an input stream (microphone).
    Stream(Consumer<[f32; 2]>),
}

impl SourceFeed {
    /// Render into both channels. Returns `false` once a buffer feed has
    /// played its last frame; the remainder is filled with silence.
    pub(crate) fn fill(&mut self, left: &mut [f32], right: &mut [f32]) -> bool {
        match self {
            SourceFeed::Silent => {
                left.fill(0.0);
                right.fill(0.0);
                true
            }
            SourceFeed::Buffer(player) => player.fill(left, right),
            SourceFeed::Stream(rx) => {
                for (l, r) in left.iter_mut().zip(right.iter_mut()) {
                    // An empty ring means the input device is behind; play silence.
                    let [a, b] = rx.pop().unwrap_or([0.0, 0.0]);
                    *l = a;
                    *r = b;
                }
                true
            }
        }
    }
}

/// Plays decoded audio at the device rate, linearly interpolating when the
/// file was recorded at a different rate.
pub struct BufferPlayer {
    audio: Arc<DecodedAudio>,
    position: f64,
    step: f64,
}

impl BufferPlayer {
    pub fn new(audio: Arc<DecodedAudio>, device_rate: f32) -> Self {
        let step = audio.sample_rate as f64 / device_rate.max(1.0) as f64;
        Self {
            audio,
            position: 0.0,
            step,
        }
    }

    /// Playback position in source frames.
    pub fn position(&self) -> f64 {
        self.position
    }

    fn fill(&mut self, left: &mut [f32], right: &mut [f32]) -> bool {
        let len = self.audio.frames();
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let idx = self.position as usize;
            if idx >= len {
                *l = 0.0;
                *r = 0.0;
                continue;
            }
            let next = (idx + 1).min(len - 1);
            let frac = (self.position - idx as f64) as f32;
            *l = lerp(self.audio.left[idx], self.audio.left[next], frac);
            *r = lerp(self.audio.right[idx], self.audio.right[next], frac);
            self.position += self.step;
        }
        (self.position as usize) < len
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(frames: usize, sample_rate: u32) -> Arc<DecodedAudio> {
        let left: Vec<f32> = (0..frames).map(|i| i as f32).collect();
        let right = left.iter().map(|v| -v).collect();
        Arc::new(DecodedAudio {
            sample_rate,
            left,
            right,
        })
    }

    #[test]
    fn buffer_plays_once_then_reports_end() {
        let mut feed = SourceFeed::Buffer(BufferPlayer::new(ramp(6, 100), 100.0));
        let (mut l, mut r) = (vec![0.0; 4], vec![0.0; 4]);

        assert!(feed.fill(&mut l, &mut r));
        assert_eq!(l, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(r, vec![0.0, -1.0, -2.0, -3.0]);

        assert!(!feed.fill(&mut l, &mut r));
        assert_eq!(l, vec![4.0, 5.0, 0.0, 0.0]);
    }

    #[test]
    fn half_rate_source_is_interpolated() {
        let mut feed = SourceFeed::Buffer(BufferPlayer::new(ramp(4, 50), 100.0));
        let (mut l, mut r) = (vec![0.0; 4], vec![0.0; 4]);
        feed.fill(&mut l, &mut r);
        assert_eq!(l, vec![0.0, 0.5, 1.0, 1.5]);
    }

    #[test]
    fn stream_underflow_plays_silence() {
        let (mut tx, rx) = rtrb::RingBuffer::<[f32; 2]>::new(8);
        tx.push([0.5, -0.5]).unwrap();
        let mut feed = SourceFeed::Stream(rx);
        let (mut l, mut r) = (vec![1.0; 3], vec![1.0; 3]);

        assert!(feed.fill(&mut l, &mut r));
        assert_eq!(l, vec![0.5, 0.0, 0.0]);
        assert_eq!(r, vec![-0.5, 0.0, 0.0]);
    }
}
