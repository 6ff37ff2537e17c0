use rtrb::Producer;

use super::source::SourceFeed;
use crate::{
    capture::{EnvelopeCapture, TimeDomainCapture},
    graph::NodeKind,
};

/// Per-block context threaded through the units of one render pass.
pub(crate) struct BlockCtx {
    /// Engine clock at the first frame of the block, in seconds.
    pub time: f64,
    pub sample_rate: f32,
    /// Latest compressor gain reduction (dB, <= 0), read by the envelope unit.
    pub reduction_db: f32,
    pub playing: bool,
    /// Set by the source unit when its feed runs out.
    pub exhausted: bool,
}

/// One processing stage owned by the [`Router`](super::Router).
pub enum Unit {
    Source(SourceFeed),
    Gain(Gain),
    Analyser(AnalyserTap),
    Capture(CaptureProcessor),
    Compressor(Compressor),
    Envelope(EnvelopeProcessor),
    Destination,
}

impl Unit {
    pub fn source() -> Self {
        Unit::Source(SourceFeed::Silent)
    }

    pub fn gain(gain: f32) -> Self {
        Unit::Gain(Gain { gain })
    }

    /// Pass-through stage that copies a mono mix to the render-side analyser.
    pub fn analyser(tx: Producer<f32>) -> Self {
        Unit::Analyser(AnalyserTap { tx })
    }

    /// Block processor feeding the time-domain sample pool.
    pub fn capture(capture: TimeDomainCapture, block_len: usize) -> Self {
        Unit::Capture(CaptureProcessor {
            capture,
            left: vec![0.0; block_len.max(1)],
            right: vec![0.0; block_len.max(1)],
            filled: 0,
        })
    }

    pub fn compressor(threshold_db: f32, sample_rate: f32) -> Self {
        Unit::Compressor(Compressor::new(threshold_db, sample_rate))
    }

    /// Block processor reading the compressor's reduction once per block.
    pub fn envelope(capture: EnvelopeCapture, block_len: usize) -> Self {
        Unit::Envelope(EnvelopeProcessor {
            capture,
            block_len: block_len.max(1),
            counted: 0,
        })
    }

    pub fn destination() -> Self {
        Unit::Destination
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Unit::Source(_) => NodeKind::Source,
            Unit::Destination => NodeKind::Sink,
            _ => NodeKind::SourceSink,
        }
    }

    pub(crate) fn process(
        &mut self,
        input: (&[f32], &[f32]),
        out: (&mut [f32], &mut [f32]),
        ctx: &mut BlockCtx,
    ) {
        let (in_l, in_r) = input;
        let (out_l, out_r) = out;
        match self {
            Unit::Source(feed) => {
                if ctx.playing {
                    if !feed.fill(out_l, out_r) {
                        ctx.exhausted = true;
                    }
                } else {
                    out_l.fill(0.0);
                    out_r.fill(0.0);
                }
            }
            Unit::Gain(g) => {
                for (o, i) in out_l.iter_mut().zip(in_l) {
                    *o = i * g.gain;
                }
                for (o, i) in out_r.iter_mut().zip(in_r) {
                    *o = i * g.gain;
                }
            }
            Unit::Analyser(tap) => {
                for (&l, &r) in in_l.iter().zip(in_r) {
                    // Drop on overflow; the analyser only needs recent samples.
                    if tap.tx.push(0.5 * (l + r)).is_err() {
                        break;
                    }
                }
                out_l.copy_from_slice(in_l);
                out_r.copy_from_slice(in_r);
            }
            Unit::Capture(proc) => {
                proc.push(in_l, in_r, ctx);
                out_l.fill(0.0);
                out_r.fill(0.0);
            }
            Unit::Compressor(comp) => {
                comp.process(in_l, in_r, out_l, out_r);
                ctx.reduction_db = comp.reduction_db();
            }
            Unit::Envelope(proc) => {
                proc.advance(in_l.len(), ctx.reduction_db);
                out_l.fill(0.0);
                out_r.fill(0.0);
            }
            Unit::Destination => {
                out_l.copy_from_slice(in_l);
                out_r.copy_from_slice(in_r);
            }
        }
    }
}

pub struct Gain {
    pub gain: f32,
}

pub struct AnalyserTap {
    tx: Producer<f32>,
}

/// Re-blocks device-sized callbacks into fixed capture blocks.
pub struct CaptureProcessor {
    capture: TimeDomainCapture,
    left: Vec<f32>,
    right: Vec<f32>,
    filled: usize,
}

impl CaptureProcessor {
    fn push(&mut self, in_l: &[f32], in_r: &[f32], ctx: &BlockCtx) {
        let block_len = self.left.len();
        let mut offset = 0;
        while offset < in_l.len() {
            let take = (block_len - self.filled).min(in_l.len() - offset);
            self.left[self.filled..self.filled + take]
                .copy_from_slice(&in_l[offset..offset + take]);
            self.right[self.filled..self.filled + take]
                .copy_from_slice(&in_r[offset..offset + take]);
            self.filled += take;
            offset += take;

            if self.filled == block_len {
                let timestamp = ctx.time + offset as f64 / ctx.sample_rate as f64;
                self.capture.on_block(&self.left, &self.right, timestamp);
                self.filled = 0;
            }
        }
    }
}

pub struct EnvelopeProcessor {
    capture: EnvelopeCapture,
    block_len: usize,
    counted: usize,
}

impl EnvelopeProcessor {
    fn advance(&mut self, frames: usize, reduction_db: f32) {
        self.counted += frames;
        while self.counted >= self.block_len {
            self.counted -= self.block_len;
            self.capture.on_reduction(reduction_db);
        }
    }
}

/*
Feed-forward compressor, hard knee, stereo linked.

  level_db  = 20·log10(max(|L|, |R|))
  target    = threshold + (level - threshold) / ratio - level   (when level > threshold)
  reduction = one-pole follow of target (attack when falling, release when rising)

Reduction is negative dB, the same sign convention as a browser
DynamicsCompressorNode, which is why the envelope capture negates it.
*/
pub struct Compressor {
    pub threshold_db: f32,
    pub ratio: f32,
    reduction_db: f32,
    attack_coeff: f32,
    release_coeff: f32,
}

impl Compressor {
    const ATTACK_SECS: f32 = 0.003;
    const RELEASE_SECS: f32 = 0.25;
    const RATIO: f32 = 12.0;

    pub fn new(threshold_db: f32, sample_rate: f32) -> Self {
        let sr = sample_rate.max(1.0);
        Self {
            threshold_db,
            ratio: Self::RATIO,
            reduction_db: 0.0,
            attack_coeff: (-1.0 / (Self::ATTACK_SECS * sr)).exp(),
            release_coeff: (-1.0 / (Self::RELEASE_SECS * sr)).exp(),
        }
    }

    /// Current gain reduction in dB (0 or negative).
    pub fn reduction_db(&self) -> f32 {
        self.reduction_db
    }

    #[inline]
    fn target(&self, level_db: f32) -> f32 {
        if level_db <= self.threshold_db {
            0.0
        } else {
            (self.threshold_db + (level_db - self.threshold_db) / self.ratio) - level_db
        }
    }

    pub fn process(&mut self, in_l: &[f32], in_r: &[f32], out_l: &mut [f32], out_r: &mut [f32]) {
        for i in 0..in_l.len() {
            let peak = in_l[i].abs().max(in_r[i].abs());
            let level_db = if peak > 1e-10 { 20.0 * peak.log10() } else { -200.0 };
            let target = self.target(level_db);
            let coeff = if target < self.reduction_db {
                self.attack_coeff
            } else {
                self.release_coeff
            };
            self.reduction_db = target + coeff * (self.reduction_db - target);

            let gain = 10.0f32.powf(self.reduction_db / 20.0);
            out_l[i] = in_l[i] * gain;
            out_r[i] = in_r[i] * gain;
        }
    }
}
