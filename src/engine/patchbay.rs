use std::sync::Arc;

use rtrb::{Consumer, Producer};

use super::{AudioEngine, EngineStatus, RouteMessage, SourceFeed, UnitId};
use crate::{
    error::{Error, Result},
    graph::NodeKind,
};

/// Control-side half of the engine.
///
/// Every call becomes one [`RouteMessage`]; nothing here blocks or touches
/// audio data. A full queue is reported as a wiring error so callers never
/// record a route the audio side did not receive.
///
/// Feeds replaced by [`set_source`](Self::set_source) come back through a
/// second ring and are dropped here, off the audio thread.
pub struct Patchbay {
    tx: Producer<RouteMessage>,
    retired: Consumer<SourceFeed>,
    kinds: Vec<NodeKind>,
    sample_rate: f32,
    status: Arc<EngineStatus>,
}

impl Patchbay {
    pub(crate) fn new(
        tx: Producer<RouteMessage>,
        retired: Consumer<SourceFeed>,
        kinds: Vec<NodeKind>,
        sample_rate: f32,
        status: Arc<EngineStatus>,
    ) -> Self {
        Self {
            tx,
            retired,
            kinds,
            sample_rate,
            status,
        }
    }

    fn send(&mut self, msg: RouteMessage) -> Result<()> {
        self.tx
            .push(msg)
            .map_err(|_| Error::GraphWiring("route queue full".into()))
    }

    fn check(&self, unit: UnitId) -> Result<()> {
        if unit.0 < self.kinds.len() {
            Ok(())
        } else {
            Err(Error::GraphWiring(format!("unit {} does not exist", unit.0)))
        }
    }

    pub fn set_gain(&mut self, unit: UnitId, gain: f32) -> Result<()> {
        self.check(unit)?;
        self.send(RouteMessage::SetGain {
            unit,
            gain: gain.max(0.0),
        })
    }

    pub fn set_threshold(&mut self, unit: UnitId, threshold_db: f32) -> Result<()> {
        self.check(unit)?;
        self.send(RouteMessage::SetThreshold { unit, threshold_db })
    }

    pub fn set_playing(&mut self, playing: bool) -> Result<()> {
        self.send(RouteMessage::SetPlaying(playing))
    }

    pub fn set_source(&mut self, feed: SourceFeed) -> Result<()> {
        self.reclaim();
        self.send(RouteMessage::SetSource(feed))
    }

    /// Drop source feeds the audio side has swapped out. Returns how many.
    pub fn reclaim(&mut self) -> usize {
        let mut dropped = 0;
        while self.retired.pop().is_ok() {
            dropped += 1;
        }
        dropped
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Monotonic engine clock in seconds.
    pub fn clock(&self) -> f64 {
        self.status.frames() as f64 / self.sample_rate as f64
    }

    pub fn status(&self) -> &EngineStatus {
        &self.status
    }
}

impl AudioEngine for Patchbay {
    fn connect(&mut self, from: UnitId, to: UnitId) -> Result<()> {
        self.check(from)?;
        self.check(to)?;
        if from >= to {
            return Err(Error::GraphWiring(format!(
                "unit {} cannot feed unit {} (runs after it)",
                from.0, to.0
            )));
        }
        self.send(RouteMessage::Connect { from, to })
    }

    fn disconnect_all(&mut self, from: UnitId) -> Result<()> {
        self.check(from)?;
        self.send(RouteMessage::DisconnectAll { from })
    }

    fn unit_kind(&self, unit: UnitId) -> Option<NodeKind> {
        self.kinds.get(unit.0).copied()
    }
}
