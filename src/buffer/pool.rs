use serde::{Deserialize, Serialize};

/*
Ping-Pong Sample Pool
=====================

The capture callback runs at audio block rate (e.g. 1024 frames at 44.1 kHz,
about every 23 ms). The render loop runs at display rate (about 16 ms) and
may stall. Neither side may wait for the other, so they exchange data through
a small pool of stereo slots guarded by one flag each:

    consumed == true    capture side owns the slot (may overwrite it)
    consumed == false   render side owns the slot (may read it)

  capture ──produce──▶ [slot 0: consumed=false] ──consume──▶ render
                       [slot 1: consumed=true ]

produce():  take the first slot with consumed == true, copy both channels
            into it, stamp it, flip consumed to false. No free slot means
            the renderer is behind: count an OVERRUN and drop the block.
            Dropping keeps display latency bounded; the picture just skips.

consume():  pick an unconsumed slot, hand it to the caller, flip consumed to
            true. No unconsumed slot means capture is behind: count an
            UNDERRUN. The caller repeats its previous frame.

Which unconsumed slot to read depends on ReadOrder:

    Oldest   read in production order (every stored block gets drawn)
    Latest   read the newest block and release older ones unread
             (they are counted as skipped)

Copying is mandatory: the callback's channel slices are only valid for the
duration of the callback.
*/

/// Order in which the render side drains unconsumed slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadOrder {
    #[default]
    Oldest,
    Latest,
}

/// One stereo block copied out of the audio callback.
pub struct BufferSlot {
    timestamp: f64,
    sequence: u64,
    consumed: bool,
    len: usize,
    left: Box<[f32]>,
    right: Box<[f32]>,
}

impl BufferSlot {
    fn new(block_len: usize) -> Self {
        Self {
            timestamp: 0.0,
            sequence: 0,
            consumed: true,
            len: 0,
            left: vec![0.0; block_len].into_boxed_slice(),
            right: vec![0.0; block_len].into_boxed_slice(),
        }
    }

    /// Engine clock (seconds) at which the block was captured.
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn left(&self) -> &[f32] {
        &self.left[..self.len]
    }

    pub fn right(&self) -> &[f32] {
        &self.right[..self.len]
    }
}

/// Handoff counters, monotonically increasing for the pool's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolCounters {
    pub produced: u64,
    pub consumed: u64,
    pub overruns: u64,
    pub underruns: u64,
    pub skipped: u64,
}

pub struct BufferPool {
    slots: Vec<BufferSlot>,
    block_len: usize,
    order: ReadOrder,
    next_sequence: u64,
    counters: PoolCounters,
}

impl BufferPool {
    pub const MIN_SLOTS: usize = 2;

    /// Allocate `slots` stereo slots of `block_len` frames. Fewer than two
    /// slots cannot ping-pong, so the count is raised to [`Self::MIN_SLOTS`].
    pub fn new(slots: usize, block_len: usize, order: ReadOrder) -> Self {
        let slots = slots.max(Self::MIN_SLOTS);
        Self {
            slots: (0..slots).map(|_| BufferSlot::new(block_len)).collect(),
            block_len,
            order,
            next_sequence: 0,
            counters: PoolCounters::default(),
        }
    }

    /// Copy one stereo block into the first free slot.
    ///
    /// Returns `false` (and counts an overrun) when every slot still waits
    /// for the renderer. Blocks longer than the slot are truncated; shorter
    /// blocks are stored with their own length.
    pub fn produce(&mut self, left: &[f32], right: &[f32], timestamp: f64) -> bool {
        let Some(slot) = self.slots.iter_mut().find(|s| s.consumed) else {
            self.counters.overruns += 1;
            return false;
        };

        let len = left.len().min(right.len()).min(self.block_len);
        slot.left[..len].copy_from_slice(&left[..len]);
        slot.right[..len].copy_from_slice(&right[..len]);
        slot.len = len;
        slot.timestamp = timestamp;
        slot.sequence = self.next_sequence;
        slot.consumed = false;

        self.next_sequence += 1;
        self.counters.produced += 1;
        true
    }

    /// Count a block the capture side had to drop for a reason other than a
    /// full pool (lock contention, a fault inside the callback).
    pub fn record_overrun(&mut self) {
        self.counters.overruns += 1;
    }

    /// Hand the next unconsumed slot to `read`, then release it to capture.
    ///
    /// Returns `None` and counts an underrun when nothing new was captured
    /// since the last call.
    pub fn consume_with<R>(&mut self, read: impl FnOnce(&BufferSlot) -> R) -> Option<R> {
        let pending = self.slots.iter().enumerate().filter(|(_, s)| !s.consumed);
        let picked = match self.order {
            ReadOrder::Oldest => pending.min_by_key(|(_, s)| s.sequence),
            ReadOrder::Latest => pending.max_by_key(|(_, s)| s.sequence),
        };
        let Some((index, _)) = picked else {
            self.counters.underruns += 1;
            return None;
        };

        if self.order == ReadOrder::Latest {
            for (i, slot) in self.slots.iter_mut().enumerate() {
                if i != index && !slot.consumed {
                    slot.consumed = true;
                    self.counters.skipped += 1;
                }
            }
        }

        let result = read(&self.slots[index]);
        self.slots[index].consumed = true;
        self.counters.consumed += 1;
        Some(result)
    }

    /// Slots currently owned by the render side.
    pub fn pending(&self) -> usize {
        self.slots.iter().filter(|s| !s.consumed).count()
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn block_len(&self) -> usize {
        self.block_len
    }

    pub fn read_order(&self) -> ReadOrder {
        self.order
    }

    pub fn counters(&self) -> PoolCounters {
        self.counters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(value: f32) -> Vec<f32> {
        vec![value; 8]
    }

    #[test]
    fn overruns_when_renderer_falls_behind() {
        let mut pool = BufferPool::new(2, 8, ReadOrder::Latest);
        let mut expected_overruns = 0;
        let mut last_stored = None;

        for i in 0..100 {
            let found_free = pool.pending() < pool.slot_count();
            let data = block(i as f32);
            let stored = pool.produce(&data, &data, i as f64);
            assert_eq!(stored, found_free);
            if stored {
                last_stored = Some(i as f32);
            } else {
                expected_overruns += 1;
            }

            if i % 3 == 2 {
                let seen = pool.consume_with(|slot| (slot.left()[0], slot.right()[7]));
                let want = last_stored.expect("a block was stored before consuming");
                assert_eq!(seen, Some((want, want)));
            }
        }

        assert_eq!(pool.counters().overruns, expected_overruns);
        assert!(expected_overruns > 0);
    }

    #[test]
    fn full_pool_keeps_unread_data() {
        let mut pool = BufferPool::new(2, 4, ReadOrder::Oldest);
        assert!(pool.produce(&[1.0; 4], &[1.0; 4], 0.0));
        assert!(pool.produce(&[2.0; 4], &[2.0; 4], 1.0));
        assert!(!pool.produce(&[3.0; 4], &[3.0; 4], 2.0));

        assert_eq!(pool.consume_with(|s| s.left()[0]), Some(1.0));
        assert_eq!(pool.consume_with(|s| s.left()[0]), Some(2.0));
        assert_eq!(pool.counters().overruns, 1);
    }

    #[test]
    fn oldest_order_drains_in_production_order() {
        let mut pool = BufferPool::new(4, 2, ReadOrder::Oldest);
        for v in [1.0, 2.0, 3.0] {
            pool.produce(&[v; 2], &[v; 2], v as f64);
        }

        let order: Vec<f64> = (0..3)
            .filter_map(|_| pool.consume_with(|s| s.timestamp()))
            .collect();
        assert_eq!(order, vec![1.0, 2.0, 3.0]);
        assert_eq!(pool.counters().skipped, 0);
    }

    #[test]
    fn latest_order_skips_stale_slots() {
        let mut pool = BufferPool::new(3, 2, ReadOrder::Latest);
        for v in [1.0, 2.0, 3.0] {
            pool.produce(&[v; 2], &[v; 2], v as f64);
        }

        assert_eq!(pool.consume_with(|s| s.left()[0]), Some(3.0));
        assert_eq!(pool.counters().skipped, 2);
        assert_eq!(pool.pending(), 0);
    }

    #[test]
    fn empty_pool_counts_underrun() {
        let mut pool = BufferPool::new(2, 16, ReadOrder::Oldest);
        assert!(pool.consume_with(|_| ()).is_none());
        assert!(pool.consume_with(|_| ()).is_none());
        assert_eq!(pool.counters().underruns, 2);
    }

    #[test]
    fn slot_count_is_at_least_two() {
        let pool = BufferPool::new(1, 16, ReadOrder::Oldest);
        assert_eq!(pool.slot_count(), BufferPool::MIN_SLOTS);
    }

    #[test]
    fn short_blocks_keep_their_length() {
        let mut pool = BufferPool::new(2, 8, ReadOrder::Oldest);
        pool.produce(&[0.5; 3], &[0.25; 3], 0.0);
        let lens = pool.consume_with(|s| (s.left().len(), s.right()[2]));
        assert_eq!(lens, Some((3, 0.25)));
    }
}
