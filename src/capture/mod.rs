//! Audio-rate capture into the structures the render loop reads.
//!
//! [`CaptureHub`] is the control/render side handle. It arms and disarms the
//! sample pool and the envelope recorder as visualizations are connected, and
//! hands out the audio-side writers ([`TimeDomainCapture`],
//! [`EnvelopeCapture`]) that processor units call once per block.
//!
//! The audio side never blocks: writers only `try_lock`, and a contended lock
//! or a panic inside the capture body is counted as an overrun instead of
//! stopping capture.

mod envelope;
mod time_domain;

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

use tracing::debug;

use crate::buffer::{BufferPool, BufferSlot, PoolCounters, ReadOrder};

pub use envelope::{EnvelopeCapture, EnvelopeRecorder};
pub use time_domain::TimeDomainCapture;

/// Shared capture targets. `None` means the matching visualization is not
/// connected and captured data is discarded.
#[derive(Default)]
pub struct CaptureState {
    pool: Option<BufferPool>,
    recorder: Option<EnvelopeRecorder>,
    retired: PoolCounters,
    retired_envelope: u64,
}

#[derive(Debug, Default)]
pub(crate) struct CaptureCounters {
    contended: AtomicU64,
    faults: AtomicU64,
}

impl CaptureCounters {
    pub(crate) fn contended(&self) {
        self.contended.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn fault(&self) {
        self.faults.fetch_add(1, Ordering::Relaxed);
        self.contended.fetch_add(1, Ordering::Relaxed);
    }
}

/// End-of-playback diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    /// Time-domain blocks stored in the pool.
    pub blocks: u64,
    /// Blocks dropped by the capture side (pool full, lock busy, fault).
    pub overruns: u64,
    /// Render frames that found nothing new to draw.
    pub underruns: u64,
    /// Panics caught inside the capture callback.
    pub faults: u64,
    /// Blocks released unread under [`ReadOrder::Latest`].
    pub stale: u64,
    /// Values appended to the envelope recorder.
    pub envelope_samples: u64,
    /// Render frames dropped for lack of a scope trigger. Filled in by the
    /// visualization session; always 0 from [`CaptureHub::stats`].
    pub skipped_frames: u64,
}

#[derive(Clone, Default)]
pub struct CaptureHub {
    state: Arc<Mutex<CaptureState>>,
    counters: Arc<CaptureCounters>,
}

impl CaptureHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CaptureState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocate a fresh sample pool; capture starts filling it immediately.
    pub fn arm_pool(&self, slots: usize, block_len: usize, order: ReadOrder) {
        let mut state = self.lock();
        retire(&mut state);
        state.pool = Some(BufferPool::new(slots, block_len, order));
        debug!(slots, block_len, ?order, "sample pool armed");
    }

    pub fn disarm_pool(&self) {
        let mut state = self.lock();
        retire(&mut state);
    }

    pub fn arm_recorder(&self, len: usize) {
        let mut state = self.lock();
        retire_recorder(&mut state);
        state.recorder = Some(EnvelopeRecorder::new(len));
        debug!(len, "envelope recorder armed");
    }

    pub fn disarm_recorder(&self) {
        let mut state = self.lock();
        retire_recorder(&mut state);
    }

    pub fn is_pool_armed(&self) -> bool {
        self.lock().pool.is_some()
    }

    pub fn is_recorder_armed(&self) -> bool {
        self.lock().recorder.is_some()
    }

    /// Writer for a time-domain processor unit.
    pub fn time_domain(&self) -> TimeDomainCapture {
        TimeDomainCapture::new(self.state.clone(), self.counters.clone())
    }

    /// Writer for an envelope processor unit.
    pub fn envelope(&self) -> EnvelopeCapture {
        EnvelopeCapture::new(self.state.clone(), self.counters.clone())
    }

    /// Render side: read the next captured block, if any.
    ///
    /// Returns `None` when no pool is armed (without counting an underrun)
    /// or when nothing new arrived (counted by the pool).
    pub fn consume_with<R>(&self, read: impl FnOnce(&BufferSlot) -> R) -> Option<R> {
        self.lock().pool.as_mut()?.consume_with(read)
    }

    /// Render side: inspect the envelope recorder.
    pub fn with_recorder<R>(&self, read: impl FnOnce(&EnvelopeRecorder) -> R) -> Option<R> {
        self.lock().recorder.as_ref().map(read)
    }

    pub fn stats(&self) -> CaptureStats {
        let state = self.lock();
        let live = state.pool.as_ref().map(BufferPool::counters).unwrap_or_default();
        let pool = add(state.retired, live);
        CaptureStats {
            blocks: pool.produced,
            overruns: pool.overruns + self.counters.contended.load(Ordering::Relaxed),
            underruns: pool.underruns,
            faults: self.counters.faults.load(Ordering::Relaxed),
            stale: pool.skipped,
            envelope_samples: state.retired_envelope
                + state.recorder.as_ref().map_or(0, EnvelopeRecorder::appended),
            skipped_frames: 0,
        }
    }
}

/// Fold the current pool's counters into the retired totals and drop it.
fn retire(state: &mut CaptureState) {
    if let Some(pool) = state.pool.take() {
        state.retired = add(state.retired, pool.counters());
    }
}

fn retire_recorder(state: &mut CaptureState) {
    if let Some(recorder) = state.recorder.take() {
        state.retired_envelope += recorder.appended();
    }
}

fn add(a: PoolCounters, b: PoolCounters) -> PoolCounters {
    PoolCounters {
        produced: a.produced + b.produced,
        consumed: a.consumed + b.consumed,
        overruns: a.overruns + b.overruns,
        underruns: a.underruns + b.underruns,
        skipped: a.skipped + b.skipped,
    }
}

/// Non-blocking lock for the audio callback. A poisoned lock is recovered:
/// the guarded data is plain samples and counters, valid after any panic.
fn try_lock(state: &Mutex<CaptureState>) -> Option<MutexGuard<'_, CaptureState>> {
    match state.try_lock() {
        Ok(guard) => Some(guard),
        Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
        Err(TryLockError::WouldBlock) => None,
    }
}

/// Run one audio-side write against the shared state.
///
/// A busy lock skips the write and counts an overrun. A panic in `write` is
/// caught and counted as a fault; the lock it poisons is recovered by the
/// next call.
pub(crate) fn guarded(
    state: &Mutex<CaptureState>,
    counters: &CaptureCounters,
    write: impl FnOnce(&mut CaptureState),
) {
    let stored = panic::catch_unwind(AssertUnwindSafe(|| {
        let Some(mut state) = try_lock(state) else {
            return false;
        };
        write(&mut state);
        true
    }));

    match stored {
        Ok(true) => {}
        Ok(false) => counters.contended(),
        Err(_) => counters.fault(),
    }
}
