pub mod buffer; // Ring buffer and ping-pong sample pool
pub mod capture; // Audio-rate capture into the pool and envelope recorder
pub mod config;
pub mod engine; // Patchbay (control side) and router (audio callback side)
pub mod error;
pub mod graph; // Named signal graph and the player topology
pub mod media;
pub mod params;
pub mod playback; // State machine and staged pipeline
pub mod viz; // Samplers, scenes and the visualization session

pub use error::{Error, Result};

/// Largest block the router renders in one pass.
pub const MAX_BLOCK_SIZE: usize = 2048;
pub const DEFAULT_BLOCK_SIZE: usize = 1024;
