use std::{fmt, str::FromStr};

use rtrb::Producer;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{manager::SignalGraph, node::NodeKind};
use crate::{
    buffer::ReadOrder,
    capture::CaptureHub,
    engine::{AudioEngine, EngineBuilder, Unit, UnitId},
    error::{Error, Result},
};

/*
Player topology
===============

                        ┌──▶ analyser                         (Spectrum)
                        │
  source ──▶ gain ──────┼──▶ capture ───────────┐             (Lissajous, Oscilloscope)
                        │                       ▼
                        ├──▶ compressor ──▶ envelope ──▶ blackhole ──▶ destination
                        │                                              ▲
                        └──────────────────────────────────────────────┘

gain → destination is the audible path and never changes. The processor
branches output silence; they are pulled through blackhole (gain 0) into the
destination only so the engine keeps them on a live path.

Unit ids are assigned in the order listed in PlayerUnits, which is also the
order the router runs them, so every edge above points to a higher id.
*/

pub const SOURCE: &str = "source";
pub const GAIN: &str = "gain";
pub const ANALYSER: &str = "analyser";
pub const CAPTURE: &str = "capture";
pub const COMPRESSOR: &str = "compressor";
pub const ENVELOPE: &str = "envelope";
pub const BLACKHOLE: &str = "blackhole";
pub const DESTINATION: &str = "destination";

const BASE_EDGES: [(&str, &str); 2] = [(SOURCE, GAIN), (GAIN, DESTINATION)];
const SPEAKER_LEG: (&str, &str) = (BLACKHOLE, DESTINATION);

/// Which visualization branch is wired after the gain stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualizationMode {
    None,
    #[default]
    Spectrum,
    Lissajous,
    Oscilloscope,
    Envelope,
}

impl VisualizationMode {
    pub const ALL: [VisualizationMode; 5] = [
        VisualizationMode::None,
        VisualizationMode::Spectrum,
        VisualizationMode::Lissajous,
        VisualizationMode::Oscilloscope,
        VisualizationMode::Envelope,
    ];

    pub fn label(self) -> &'static str {
        match self {
            VisualizationMode::None => "none",
            VisualizationMode::Spectrum => "spectrum",
            VisualizationMode::Lissajous => "lissajous",
            VisualizationMode::Oscilloscope => "oscilloscope",
            VisualizationMode::Envelope => "envelope",
        }
    }

    /// Cycle through the modes, wrapping after the last one.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|&m| m == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Edges this mode adds after `gain`, upstream first.
    pub fn branch(self) -> &'static [(&'static str, &'static str)] {
        match self {
            VisualizationMode::None => &[],
            VisualizationMode::Spectrum => &[(GAIN, ANALYSER)],
            VisualizationMode::Lissajous | VisualizationMode::Oscilloscope => {
                &[(GAIN, CAPTURE), (CAPTURE, BLACKHOLE)]
            }
            VisualizationMode::Envelope => &[
                (GAIN, COMPRESSOR),
                (COMPRESSOR, ENVELOPE),
                (ENVELOPE, BLACKHOLE),
            ],
        }
    }

    /// Whether the mode reads time-domain blocks from the sample pool.
    pub fn uses_pool(self) -> bool {
        matches!(
            self,
            VisualizationMode::Lissajous | VisualizationMode::Oscilloscope
        )
    }
}

impl fmt::Display for VisualizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for VisualizationMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::Config(format!("unknown visualization mode '{s}'")))
    }
}

/// Unit ids of the player's fixed node set.
#[derive(Debug, Clone, Copy)]
pub struct PlayerUnits {
    pub source: UnitId,
    pub gain: UnitId,
    pub analyser: UnitId,
    pub capture: UnitId,
    pub compressor: UnitId,
    pub envelope: UnitId,
    pub blackhole: UnitId,
    pub destination: UnitId,
}

impl PlayerUnits {
    /// Register the player's units on `builder`, in run order.
    pub fn build(
        builder: &mut EngineBuilder,
        hub: &CaptureHub,
        analyser_tx: Producer<f32>,
        block_size: usize,
        gain: f32,
        threshold_db: f32,
        sample_rate: f32,
    ) -> Self {
        Self {
            source: builder.add(Unit::source()),
            gain: builder.add(Unit::gain(gain)),
            analyser: builder.add(Unit::analyser(analyser_tx)),
            capture: builder.add(Unit::capture(hub.time_domain(), block_size)),
            compressor: builder.add(Unit::compressor(threshold_db, sample_rate)),
            envelope: builder.add(Unit::envelope(hub.envelope(), block_size)),
            blackhole: builder.add(Unit::gain(0.0)),
            destination: builder.add(Unit::destination()),
        }
    }

    fn nodes(&self) -> [(&'static str, NodeKind, UnitId); 8] {
        [
            (SOURCE, NodeKind::Source, self.source),
            (GAIN, NodeKind::SourceSink, self.gain),
            (ANALYSER, NodeKind::SourceSink, self.analyser),
            (CAPTURE, NodeKind::SourceSink, self.capture),
            (COMPRESSOR, NodeKind::SourceSink, self.compressor),
            (ENVELOPE, NodeKind::SourceSink, self.envelope),
            (BLACKHOLE, NodeKind::SourceSink, self.blackhole),
            (DESTINATION, NodeKind::Sink, self.destination),
        ]
    }
}

/// Sizes for the capture targets armed when a branch is connected.
#[derive(Debug, Clone, Copy)]
pub struct CaptureLayout {
    pub pool_size: usize,
    pub block_size: usize,
    pub read_order: ReadOrder,
    /// Envelope recorder length in blocks.
    pub envelope_len: usize,
}

/// The player's signal graph plus the capture targets of the active branch.
pub struct PlayerGraph<E> {
    graph: SignalGraph<E>,
    units: PlayerUnits,
    mode: VisualizationMode,
    hub: CaptureHub,
    layout: CaptureLayout,
}

impl<E: AudioEngine> PlayerGraph<E> {
    /// Build the graph and wire the audible path; no visualization yet.
    pub fn new(
        engine: E,
        units: PlayerUnits,
        hub: CaptureHub,
        layout: CaptureLayout,
    ) -> Result<Self> {
        let mut graph = SignalGraph::new(engine, units.nodes())?;
        for (from, to) in BASE_EDGES {
            graph.connect(from, to)?;
        }
        Ok(Self {
            graph,
            units,
            mode: VisualizationMode::None,
            hub,
            layout,
        })
    }

    /// Rewire for `mode`.
    ///
    /// The speaker leg is dropped first and restored last; branches not used
    /// by `mode` are torn down (downstream edges first) before the target is
    /// connected. Wiring failures are logged and the remaining steps still
    /// run; the first one is returned.
    pub fn set_visualization(&mut self, mode: VisualizationMode) -> Result<()> {
        if mode == self.mode {
            return Ok(());
        }
        info!(from = %self.mode, to = %mode, "switching visualization");

        let target = mode.branch();
        let mut first_err = None;
        let mut note = |res: Result<bool>| {
            if let Err(err) = res {
                first_err.get_or_insert(err);
            }
        };

        note(self.graph.disconnect(SPEAKER_LEG.0, SPEAKER_LEG.1));
        for other in VisualizationMode::ALL {
            for &(from, to) in other.branch().iter().rev() {
                if !target.contains(&(from, to)) {
                    note(self.graph.disconnect(from, to));
                }
            }
        }

        if mode.uses_pool() {
            self.hub.arm_pool(
                self.layout.pool_size,
                self.layout.block_size,
                self.layout.read_order,
            );
        } else {
            self.hub.disarm_pool();
        }
        if mode == VisualizationMode::Envelope {
            self.hub.arm_recorder(self.layout.envelope_len);
        } else {
            self.hub.disarm_recorder();
        }

        for &(from, to) in target {
            note(self.graph.connect(from, to));
        }
        note(self.graph.connect(SPEAKER_LEG.0, SPEAKER_LEG.1));

        self.mode = mode;
        first_err.map_or(Ok(()), Err)
    }

    pub fn mode(&self) -> VisualizationMode {
        self.mode
    }

    pub fn units(&self) -> &PlayerUnits {
        &self.units
    }

    pub fn hub(&self) -> &CaptureHub {
        &self.hub
    }

    pub fn graph(&self) -> &SignalGraph<E> {
        &self.graph
    }

    pub fn engine(&self) -> &E {
        self.graph.engine()
    }

    pub fn engine_mut(&mut self) -> &mut E {
        self.graph.engine_mut()
    }
}
