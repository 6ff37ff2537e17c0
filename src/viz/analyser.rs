//! Render-side frequency analyser fed by the engine's analyser tap.

use std::f32::consts::PI;
use std::sync::Arc;

use rtrb::Consumer;
use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::buffer::RingBuffer;

/*
Per frame:

  samples ──▶ last fft_size mono samples ──▶ × Blackman ──▶ FFT ──▶ |X[k]| / N
                                                                     │
        dB[k] = 20·log10(S[k])  ◀──  S[k] = τ·S_prev[k] + (1 − τ)·|X[k]|/N

τ is the smoothing constant in [0, 1]. Only the first fft_size / 2 bins are
kept. min/max decibels do not clip here; they are the display range the
spectrum sampler maps into.
*/

pub struct Analyser {
    rx: Option<Consumer<f32>>,
    history: RingBuffer<f32>,
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    decibels: Vec<f32>,
    min_decibels: f32,
    max_decibels: f32,
    smoothing: f32,
}

impl Analyser {
    /// `fft_size` must be a power of two; the config layer checks this.
    pub fn new(fft_size: usize, min_decibels: f32, max_decibels: f32, smoothing: f32) -> Self {
        let fft_size = fft_size.max(2);
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        let bins = fft_size / 2;

        Self {
            rx: None,
            history: RingBuffer::new(fft_size),
            window: blackman(fft_size),
            fft,
            scratch: vec![Complex::new(0.0, 0.0); fft_size],
            smoothed: vec![0.0; bins],
            decibels: vec![f32::NEG_INFINITY; bins],
            min_decibels,
            max_decibels,
            smoothing: smoothing.clamp(0.0, 1.0),
        }
    }

    /// Attach the consumer end of the engine's analyser tap.
    pub fn with_input(mut self, rx: Consumer<f32>) -> Self {
        self.rx = Some(rx);
        self
    }

    /// Pull every queued sample into the history. Returns how many arrived.
    pub fn drain(&mut self) -> usize {
        let Some(rx) = self.rx.as_mut() else {
            return 0;
        };
        let available = rx.slots();
        let Ok(chunk) = rx.read_chunk(available) else {
            return 0;
        };
        let (first, second) = chunk.as_slices();
        for &s in first.iter().chain(second) {
            self.history.push(s);
        }
        chunk.commit_all();
        available
    }

    /// Push samples directly, bypassing the tap.
    pub fn push_samples(&mut self, samples: &[f32]) {
        for &s in samples {
            self.history.push(s);
        }
    }

    /// Drain the tap and recompute the spectrum from the latest history.
    pub fn update(&mut self) -> &[f32] {
        self.drain();
        self.analyse()
    }

    /// Recompute the spectrum from the current history. A short history is
    /// zero-padded at the front (unwritten ring slots read as 0.0 and come
    /// first in chronological order).
    pub fn analyse(&mut self) -> &[f32] {
        let n = self.scratch.len();
        for ((c, s), w) in self
            .scratch
            .iter_mut()
            .zip(self.history.iter_chronological())
            .zip(&self.window)
        {
            *c = Complex::new(s * w, 0.0);
        }

        self.fft.process(&mut self.scratch);

        let tau = self.smoothing;
        let norm = 1.0 / n as f32;
        for (k, (smoothed, db)) in self
            .smoothed
            .iter_mut()
            .zip(self.decibels.iter_mut())
            .enumerate()
        {
            let magnitude = self.scratch[k].norm() * norm;
            *smoothed = tau * *smoothed + (1.0 - tau) * magnitude;
            *db = 20.0 * smoothed.log10();
        }
        &self.decibels
    }

    /// Last computed spectrum, `fft_size / 2` bins in dB.
    pub fn decibels(&self) -> &[f32] {
        &self.decibels
    }

    pub fn fft_size(&self) -> usize {
        self.scratch.len()
    }

    pub fn min_decibels(&self) -> f32 {
        self.min_decibels
    }

    pub fn max_decibels(&self) -> f32 {
        self.max_decibels
    }

    pub fn smoothing(&self) -> f32 {
        self.smoothing
    }

    /// Lower edge of the display range. Ignored if it would meet the upper edge.
    pub fn set_min_decibels(&mut self, db: f32) {
        if db < self.max_decibels {
            self.min_decibels = db;
        }
    }

    pub fn set_smoothing(&mut self, smoothing: f32) {
        self.smoothing = smoothing.clamp(0.0, 1.0);
    }
}

fn blackman(len: usize) -> Vec<f32> {
    const A0: f32 = 0.42;
    const A1: f32 = 0.5;
    const A2: f32 = 0.08;
    let denom = len.max(2) as f32;
    (0..len)
        .map(|i| {
            let phase = 2.0 * PI * i as f32 / denom;
            A0 - A1 * phase.cos() + A2 * (2.0 * phase).cos()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq_bin: usize, n: usize, amp: f32) -> Vec<f32> {
        (0..n)
            .map(|i| amp * (2.0 * PI * freq_bin as f32 * i as f32 / n as f32).sin())
            .collect()
    }

    #[test]
    fn sine_peaks_in_its_bin() {
        let mut analyser = Analyser::new(256, -110.0, -10.0, 0.0);
        analyser.push_samples(&sine(16, 256, 1.0));
        let db = analyser.analyse().to_vec();

        assert_eq!(db.len(), 128);
        let loudest = db
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i);
        assert_eq!(loudest, Some(16));
        assert!(db[16] > db[60] + 40.0);
    }

    #[test]
    fn smoothing_blends_with_previous_frame() {
        let mut analyser = Analyser::new(64, -110.0, -10.0, 0.5);
        analyser.push_samples(&sine(4, 64, 1.0));
        let loud = analyser.analyse()[4];
        analyser.push_samples(&[0.0; 64]);
        let decayed = analyser.analyse()[4];

        // Half the magnitude is -6 dB.
        assert!((loud - decayed - 6.02).abs() < 0.05, "{loud} -> {decayed}");
    }

    #[test]
    fn drains_tap_samples() {
        let (mut tx, rx) = rtrb::RingBuffer::<f32>::new(32);
        let mut analyser = Analyser::new(16, -110.0, -10.0, 0.3).with_input(rx);
        for i in 0..20 {
            tx.push(i as f32).unwrap();
        }
        assert_eq!(analyser.drain(), 20);
        assert_eq!(analyser.drain(), 0);
        assert_eq!(analyser.update().len(), 8);
    }

    #[test]
    fn decibel_range_cannot_invert() {
        let mut analyser = Analyser::new(16, -110.0, -10.0, 0.3);
        analyser.set_min_decibels(-5.0);
        assert_eq!(analyser.min_decibels(), -110.0);
        analyser.set_min_decibels(-90.0);
        assert_eq!(analyser.min_decibels(), -90.0);
        analyser.set_smoothing(3.0);
        assert_eq!(analyser.smoothing(), 1.0);
    }
}
