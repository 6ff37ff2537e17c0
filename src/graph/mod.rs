//! Named signal graph mirrored onto the audio engine.
//!
//! [`SignalGraph`] is generic over any [`AudioEngine`](crate::engine::AudioEngine)
//! and owns the edge set. [`PlayerGraph`] lays out the player's fixed node set
//! and switches between visualization branches.

pub mod layout;
pub mod manager;
pub mod node;

pub use layout::{CaptureLayout, PlayerGraph, PlayerUnits, VisualizationMode};
pub use manager::SignalGraph;
pub use node::{GraphNode, NodeKind};
