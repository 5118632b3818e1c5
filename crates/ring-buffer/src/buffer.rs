//! Fixed-Capacity Ring Buffer Implementation

use crate::RingBufferError;
use std::collections::VecDeque;

/// Default window capacity (60 readings = ~5 min at a 5 s cadence)
pub const DEFAULT_CAPACITY: usize = 60;

/// Fixed-capacity rolling window that evicts the oldest entry when full
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    /// Pre-allocated storage, oldest entry at the front
    storage: VecDeque<T>,
    /// Maximum number of entries held
    capacity: usize,
    /// Total entries ever pushed (for statistics)
    total_written: usize,
}

impl<T> RingBuffer<T> {
    /// Create a new ring buffer with given capacity
    pub fn new(capacity: usize) -> Result<Self, RingBufferError> {
        if capacity == 0 {
            return Err(RingBufferError::ZeroCapacity);
        }
        Ok(Self {
            storage: VecDeque::with_capacity(capacity),
            capacity,
            total_written: 0,
        })
    }

    /// Create a buffer with default capacity (60 entries)
    pub fn with_default_capacity() -> Self {
        Self {
            storage: VecDeque::with_capacity(DEFAULT_CAPACITY),
            capacity: DEFAULT_CAPACITY,
            total_written: 0,
        }
    }

    /// Push an entry, returning the evicted oldest entry if the buffer was full
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.storage.len() >= self.capacity {
            self.storage.pop_front()
        } else {
            None
        };
        self.storage.push_back(item);
        self.total_written += 1;
        evicted
    }

    /// Get the number of entries currently in the buffer
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Check if buffer is full
    pub fn is_full(&self) -> bool {
        self.storage.len() == self.capacity
    }

    /// Get the buffer capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get fill ratio (0.0 to 1.0)
    pub fn fill_ratio(&self) -> f64 {
        self.len() as f64 / self.capacity as f64
    }

    /// Most recently pushed entry
    pub fn latest(&self) -> Option<&T> {
        self.storage.back()
    }

    /// Iterate entries oldest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.storage.iter()
    }

    /// Borrow the last N entries (most recent first)
    pub fn read_last(&self, count: usize) -> impl Iterator<Item = &T> {
        self.storage.iter().rev().take(count)
    }

    /// Get total entries written (for statistics)
    pub fn total_written(&self) -> usize {
        self.total_written
    }

    /// Clear the buffer
    pub fn clear(&mut self) {
        self.storage.clear();
    }
}

impl<T: Clone> RingBuffer<T> {
    /// Copy the current contents, oldest first
    pub fn snapshot(&self) -> Vec<T> {
        self.storage.iter().cloned().collect()
    }
}

impl<T> Default for RingBuffer<T> {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
