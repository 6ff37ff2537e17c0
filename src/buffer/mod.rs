//! Buffers shared between the audio callback and the render loop.

/// Stereo slot pool for the capture → render handoff.
pub mod pool;
/// Fixed-capacity circular buffer.
pub mod ring;

pub use pool::{BufferPool, BufferSlot, PoolCounters, ReadOrder};
pub use ring::RingBuffer;
