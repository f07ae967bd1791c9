//! Specialized collection types

/// Fixed-capacity ring buffer that overwrites its oldest entry once full.
///
/// Storage is allocated once in [`RingBuffer::new`] and reused for the lifetime
/// of the buffer, so pushing never allocates.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    items: Vec<T>,
    head: usize,
    len: usize,
}

impl<T: Copy + Default> RingBuffer<T> {
    /// Create a ring buffer holding at most `capacity` items (minimum 1)
    pub fn new(capacity: usize) -> Self {
        Self {
            items: vec![T::default(); capacity.max(1)],
            head: 0,
            len: 0,
        }
    }

    /// Write an item at the head, overwriting the oldest one when full
    pub fn push(&mut self, item: T) {
        self.items[self.head] = item;
        self.head = (self.head + 1) % self.items.len();
        self.len = (self.len + 1).min(self.items.len());
    }

    /// Maximum number of items
    pub fn capacity(&self) -> usize {
        self.items.len()
    }

    /// Number of items written so far, capped at capacity
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if nothing was pushed yet
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Slot the next push will write to
    pub fn head(&self) -> usize {
        self.head
    }

    /// Most recently pushed item
    pub fn latest(&self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let index = (self.head + self.items.len() - 1) % self.items.len();
        Some(self.items[index])
    }

    /// Items from oldest to newest
    pub fn iter_chronological(&self) -> impl Iterator<Item = &T> + '_ {
        let capacity = self.items.len();
        let start = (self.head + capacity - self.len) % capacity;
        (0..self.len).map(move |offset| &self.items[(start + offset) % capacity])
    }
}
