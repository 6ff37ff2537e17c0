//! The audio engine the signal graph drives.
//!
//! The engine is split across the two threads that touch audio:
//!
//! - [`Patchbay`] lives on the control/render thread. It implements
//!   [`AudioEngine`] by turning connect / disconnect-all calls into
//!   [`RouteMessage`]s pushed onto a lock-free ring.
//! - [`Router`] lives inside the device callback. It pops the messages at the
//!   start of every callback, so each block renders against one consistent
//!   routing table, then runs its units in creation order.
//!
//! Units are created once through [`EngineBuilder`]; afterwards only the
//! routes between them change.

/// Control-side handle implementing [`AudioEngine`].
pub mod patchbay;
/// Audio-side unit runner.
pub mod router;
/// Playback feeds for the source unit (decoded buffer or live input).
pub mod source;
/// Processing units (gain, compressor, analyser tap, capture processors).
pub mod units;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use rtrb::RingBuffer;

use crate::{error::Result, graph::NodeKind};

pub use patchbay::Patchbay;
pub use router::Router;
pub use source::SourceFeed;
pub use units::Unit;

/// Capacity of the control → audio route ring.
pub const ROUTE_QUEUE_LEN: usize = 256;

/// Index of a unit inside the engine. Units run in ascending id order, so a
/// route may only point from a lower id to a higher one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub(crate) usize);

impl UnitId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// The connection primitive the graph manager mirrors its edges onto.
///
/// Like a browser audio node, disconnection only exists at node granularity:
/// `disconnect_all` drops every outgoing route of `from`.
pub trait AudioEngine {
    fn connect(&mut self, from: UnitId, to: UnitId) -> Result<()>;

    fn disconnect_all(&mut self, from: UnitId) -> Result<()>;

    /// What the unit behind `unit` can do, if the engine knows. The graph
    /// checks its node tags against this once, at construction.
    fn unit_kind(&self, _unit: UnitId) -> Option<NodeKind> {
        None
    }
}

/// Messages from the control thread to the audio callback.
pub enum RouteMessage {
    Connect { from: UnitId, to: UnitId },
    DisconnectAll { from: UnitId },
    SetGain { unit: UnitId, gain: f32 },
    SetThreshold { unit: UnitId, threshold_db: f32 },
    SetPlaying(bool),
    SetSource(SourceFeed),
}

/// State the audio side publishes back to the control side.
#[derive(Debug, Default)]
pub struct EngineStatus {
    frames: AtomicU64,
    ended: AtomicBool,
}

impl EngineStatus {
    pub(crate) fn advance(&self, frames: usize) {
        self.frames.fetch_add(frames as u64, Ordering::Relaxed);
    }

    pub(crate) fn mark_ended(&self) {
        self.ended.store(true, Ordering::Release);
    }

    /// Frames rendered since the engine started.
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    /// Returns `true` once per exhausted source.
    pub fn take_ended(&self) -> bool {
        self.ended.swap(false, Ordering::AcqRel)
    }
}

/// Collects units, then splits into the control and audio halves.
pub struct EngineBuilder {
    units: Vec<Unit>,
    sample_rate: f32,
}

impl EngineBuilder {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            units: Vec::new(),
            sample_rate,
        }
    }

    /// Register a unit; it will run after every unit added before it.
    pub fn add(&mut self, unit: Unit) -> UnitId {
        self.units.push(unit);
        UnitId(self.units.len() - 1)
    }

    pub fn build(self) -> (Patchbay, Router) {
        let (tx, rx) = RingBuffer::<RouteMessage>::new(ROUTE_QUEUE_LEN);
        // One retired feed per SetSource message at most, so this never fills
        // while the patchbay reclaims before each send.
        let (retired_tx, retired_rx) = RingBuffer::<SourceFeed>::new(ROUTE_QUEUE_LEN);
        let status = Arc::new(EngineStatus::default());
        let kinds = self.units.iter().map(Unit::kind).collect();
        let patchbay = Patchbay::new(tx, retired_rx, kinds, self.sample_rate, status.clone());
        let router = Router::new(self.units, rx, retired_tx, self.sample_rate, status);
        (patchbay, router)
    }
}
