use std::sync::Arc;

use rtrb::{Consumer, Producer};

use super::{
    units::{BlockCtx, Unit},
    EngineStatus, RouteMessage, SourceFeed, UnitId,
};
use crate::MAX_BLOCK_SIZE;

/// Audio-side half of the engine, owned by the device callback.
///
/// Each unit's input is the sum of the outputs routed into it. Units run in
/// creation order, which the [`Patchbay`](super::Patchbay) enforces by only
/// accepting routes from lower to higher ids. Nothing in the render path
/// allocates: buffers and the route table are sized up front.
pub struct Router {
    units: Vec<Unit>,
    routes: Vec<(UnitId, UnitId)>,
    rx: Consumer<RouteMessage>,
    retired: Producer<SourceFeed>,
    outputs: Vec<[Vec<f32>; 2]>,
    mix: [Vec<f32>; 2],
    destination: Option<usize>,
    sample_rate: f32,
    frames: u64,
    playing: bool,
    reduction_db: f32,
    status: Arc<EngineStatus>,
}

impl Router {
    pub(crate) fn new(
        units: Vec<Unit>,
        rx: Consumer<RouteMessage>,
        retired: Producer<SourceFeed>,
        sample_rate: f32,
        status: Arc<EngineStatus>,
    ) -> Self {
        let outputs = units
            .iter()
            .map(|_| [vec![0.0; MAX_BLOCK_SIZE], vec![0.0; MAX_BLOCK_SIZE]])
            .collect();
        let destination = units.iter().position(|u| matches!(u, Unit::Destination));
        let route_capacity = units.len() * units.len();

        Self {
            units,
            routes: Vec::with_capacity(route_capacity),
            rx,
            retired,
            outputs,
            mix: [vec![0.0; MAX_BLOCK_SIZE], vec![0.0; MAX_BLOCK_SIZE]],
            destination,
            sample_rate,
            frames: 0,
            playing: false,
            reduction_db: 0.0,
            status,
        }
    }

    /// Apply every queued control message.
    pub fn apply_messages(&mut self) {
        while let Ok(msg) = self.rx.pop() {
            match msg {
                RouteMessage::Connect { from, to } => {
                    if !self.routes.contains(&(from, to)) {
                        self.routes.push((from, to));
                    }
                }
                RouteMessage::DisconnectAll { from } => {
                    self.routes.retain(|&(f, _)| f != from);
                }
                RouteMessage::SetGain { unit, gain } => {
                    if let Some(Unit::Gain(g)) = self.units.get_mut(unit.0) {
                        g.gain = gain;
                    }
                }
                RouteMessage::SetThreshold { unit, threshold_db } => {
                    if let Some(Unit::Compressor(c)) = self.units.get_mut(unit.0) {
                        c.threshold_db = threshold_db;
                    }
                }
                RouteMessage::SetPlaying(playing) => self.playing = playing,
                RouteMessage::SetSource(feed) => {
                    let current = self.units.iter_mut().find_map(|unit| match unit {
                        Unit::Source(current) => Some(current),
                        _ => None,
                    });
                    // The old feed may own a whole decoded file; the patchbay
                    // frees it. Without a source unit the new feed goes back.
                    let old = match current {
                        Some(current) => std::mem::replace(current, feed),
                        None => feed,
                    };
                    let _ = self.retired.push(old);
                }
            }
        }
    }

    /// Render up to [`MAX_BLOCK_SIZE`] frames and return the destination's
    /// stereo output.
    pub fn render_block(&mut self, frames: usize) -> (&[f32], &[f32]) {
        let n = frames.min(MAX_BLOCK_SIZE);
        let mut ctx = BlockCtx {
            time: self.frames as f64 / self.sample_rate as f64,
            sample_rate: self.sample_rate,
            reduction_db: self.reduction_db,
            playing: self.playing,
            exhausted: false,
        };

        let Router {
            units,
            routes,
            outputs,
            mix,
            ..
        } = &mut *self;
        let [mix_l, mix_r] = mix;

        for idx in 0..units.len() {
            mix_l[..n].fill(0.0);
            mix_r[..n].fill(0.0);
            for &(from, to) in routes.iter() {
                if to.0 != idx {
                    continue;
                }
                let [src_l, src_r] = &outputs[from.0];
                for (m, s) in mix_l[..n].iter_mut().zip(&src_l[..n]) {
                    *m += s;
                }
                for (m, s) in mix_r[..n].iter_mut().zip(&src_r[..n]) {
                    *m += s;
                }
            }

            let [out_l, out_r] = &mut outputs[idx];
            units[idx].process(
                (&mix_l[..n], &mix_r[..n]),
                (&mut out_l[..n], &mut out_r[..n]),
                &mut ctx,
            );
        }

        if ctx.exhausted {
            self.playing = false;
            self.status.mark_ended();
        }
        self.reduction_db = ctx.reduction_db;
        self.frames += n as u64;
        self.status.advance(n);

        match self.destination {
            Some(d) => {
                let [l, r] = &self.outputs[d];
                (&l[..n], &r[..n])
            }
            None => (&self.mix[0][..0], &self.mix[1][..0]),
        }
    }

    /// Device callback entry point: fill an interleaved output buffer.
    pub fn process_interleaved(&mut self, data: &mut [f32], channels: usize) {
        self.apply_messages();

        let channels = channels.max(1);
        let total_frames = data.len() / channels;
        let mut frames_written = 0;

        while frames_written < total_frames {
            let frames_to_render = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
            let out_off = frames_written * channels;
            let (left, right) = self.render_block(frames_to_render);

            for i in 0..frames_to_render {
                let (l, r) = (
                    left.get(i).copied().unwrap_or(0.0),
                    right.get(i).copied().unwrap_or(0.0),
                );
                let frame = &mut data[out_off + i * channels..out_off + (i + 1) * channels];
                match frame {
                    [mono] => *mono = 0.5 * (l + r),
                    [fl, fr, rest @ ..] => {
                        *fl = l;
                        *fr = r;
                        rest.fill(0.0);
                    }
                    [] => {}
                }
            }

            frames_written += frames_to_render;
        }
    }

    /// Current route table, mirrored from the control side.
    pub fn routes(&self) -> &[(UnitId, UnitId)] {
        &self.routes
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}
