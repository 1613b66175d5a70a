//! Fixed-capacity sliding window.
//!
//! Storage grows with the samples pushed until it reaches capacity, then a
//! head index wraps and each push overwrites the oldest sample.

use crate::Period;

#[derive(Debug, Clone)]
pub struct RingWindow {
    buffer: Vec<f64>,
    capacity: usize,
    head: usize,
}

impl RingWindow {
    pub fn new(capacity: Period) -> Self {
        Self {
            buffer: Vec::new(),
            capacity: capacity.get(),
            head: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Append a sample, evicting the oldest one once the window is full.
    pub fn push(&mut self, value: f64) {
        if self.buffer.len() < self.capacity {
            // head stays 0 until the buffer first fills
            self.buffer.push(value);
        } else {
            self.buffer[self.head] = value;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    /// Samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        let (newer, older) = self.buffer.split_at(self.head);
        older.iter().chain(newer).copied()
    }

    /// Arithmetic mean, `None` when empty.
    pub fn mean(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        Some(self.iter().sum::<f64>() / self.len() as f64)
    }

    /// Population standard deviation, 0 when empty.
    pub fn std_dev(&self) -> f64 {
        let Some(mean) = self.mean() else {
            return 0.0;
        };
        let var = self.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / self.len() as f64;
        var.sqrt()
    }
}
