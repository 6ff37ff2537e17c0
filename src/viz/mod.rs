//! Frame-rate visualizations.
//!
//! Each sampler is a plain function from input samples (plus the
//! visualization's [`PeakTracker`]) to a [`Scene`], a draw list in canvas
//! coordinates that the terminal renderer rasterizes.
//! [`VisualizationSession`] owns the per-mode state and picks the sampler,
//! and keeps the frame timings and event log shown over the picture.

pub mod analyser;
pub mod diagnostics;
pub mod envelope;
pub mod lissajous;
pub mod peak;
pub mod scene;
pub mod scope;
pub mod session;
pub mod spectrum;

pub use analyser::Analyser;
pub use diagnostics::{EventLog, FrameTimings};
pub use peak::PeakTracker;
pub use scene::{Hsla, Scene, Shape};
pub use scope::find_trigger_level;
pub use session::{FrameOutcome, FrameSources, VisualizationSession};
