//! Bounded rolling buffers of earth-frame acceleration.
//!
//! Vertical samples and horizontal (x, y) pairs are kept in parallel FIFOs
//! of fixed capacity. Pushing beyond capacity evicts the oldest entry, so
//! both push and evict are O(1) and memory stays fixed.

use std::collections::VecDeque;

use crate::types::SensorSample;

/// Parallel bounded FIFOs of vertical and horizontal acceleration.
///
/// Invariant: `len() <= capacity()`, and both FIFOs always hold the same
/// number of entries.
#[derive(Debug, Clone)]
pub struct AccelerationBuffer {
    vertical: VecDeque<f64>,
    horizontal: VecDeque<(f64, f64)>,
    capacity: usize,
}

/// A consistent copy of the buffer contents, oldest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BufferSnapshot {
    pub vertical: Vec<f64>,
    pub horizontal_x: Vec<f64>,
    pub horizontal_y: Vec<f64>,
}

impl AccelerationBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            vertical: VecDeque::with_capacity(capacity),
            horizontal: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append one sample, evicting the oldest if full.
    pub fn push(&mut self, sample: &SensorSample) {
        if self.capacity == 0 {
            return;
        }
        if self.vertical.len() == self.capacity {
            self.vertical.pop_front();
            self.horizontal.pop_front();
        }
        self.vertical.push_back(sample.vertical_accel);
        self.horizontal.push_back((sample.horizontal_x, sample.horizontal_y));
    }

    pub fn len(&self) -> usize {
        self.vertical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertical.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.vertical.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Vertical samples, oldest first.
    pub fn vertical(&self) -> impl Iterator<Item = f64> + '_ {
        self.vertical.iter().copied()
    }

    /// Copy out all three axes at once.
    pub fn snapshot(&self) -> BufferSnapshot {
        let (horizontal_x, horizontal_y) = self.horizontal.iter().copied().unzip();
        BufferSnapshot {
            vertical: self.vertical.iter().copied().collect(),
            horizontal_x,
            horizontal_y,
        }
    }

    pub fn clear(&mut self) {
        self.vertical.clear();
        self.horizontal.clear();
    }
}

impl BufferSnapshot {
    /// Start offsets of every full window of `window_size` at `stride`.
    ///
    /// Empty when fewer than `window_size` samples are held.
    pub fn window_starts(&self, window_size: usize, stride: usize) -> impl Iterator<Item = usize> {
        let last = if window_size > 0 && stride > 0 && self.vertical.len() >= window_size {
            Some(self.vertical.len() - window_size)
        } else {
            None
        };
        last.into_iter()
            .flat_map(move |last| (0..=last).step_by(stride.max(1)))
    }
}
