//! Playback lifecycle: the state machine and the staged pipeline driving it.

pub mod pipeline;
pub mod state;

pub use pipeline::{LoadedMedia, Pipeline, PipelineStages};
pub use state::{AudioState, PlaybackEvent, PlaybackMachine};
