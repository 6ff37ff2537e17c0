//! Fixed-capacity circular buffer with a single write cursor.
//!
//! Writes never fail: once full, each push overwrites the oldest slot. Reads
//! are either raw (by slot index) or chronological, starting at the write
//! cursor so the oldest value comes first.

pub struct RingBuffer<T> {
    data: Box<[T]>,
    head: usize,
    filled: usize,
}

impl<T: Copy + Default> RingBuffer<T> {
    /// Create a ring holding `capacity` values (at least one), all defaulted.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: vec![T::default(); capacity].into_boxed_slice(),
            head: 0,
            filled: 0,
        }
    }

    /// Write at the cursor and advance it, wrapping at capacity.
    #[inline]
    pub fn push(&mut self, value: T) {
        self.data[self.head] = value;
        self.head = (self.head + 1) % self.data.len();
        if self.filled < self.data.len() {
            self.filled += 1;
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of values written so far, saturating at capacity.
    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// Slot the next push will overwrite.
    pub fn write_index(&self) -> usize {
        self.head
    }

    /// Raw slot access, independent of the cursor.
    pub fn get(&self, index: usize) -> Option<T> {
        self.data.get(index).copied()
    }

    /// Most recently written value.
    pub fn latest(&self) -> Option<T> {
        if self.filled == 0 {
            return None;
        }
        let idx = (self.head + self.data.len() - 1) % self.data.len();
        Some(self.data[idx])
    }

    /// All slots from oldest to newest, including never-written defaults.
    pub fn iter_chronological(&self) -> impl Iterator<Item = T> + '_ {
        let cap = self.data.len();
        (0..cap).map(move |i| self.data[(self.head + i) % cap])
    }

    pub fn clear(&mut self) {
        self.data.fill(T::default());
        self.head = 0;
        self.filled = 0;
    }
}
