//! Small smoothing primitives owned by the per-session state.

use std::collections::VecDeque;

/// Fixed-capacity trailing mean; the oldest value is evicted on insert.
#[derive(Debug, Clone)]
pub struct TrailingMean {
    values: VecDeque<f32>,
    capacity: usize,
}

impl TrailingMean {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert a value and return the mean of the buffer.
    pub fn push(&mut self, value: f32) -> f32 {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
        self.mean().unwrap_or(value)
    }

    pub fn mean(&self) -> Option<f32> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.values.iter().sum::<f32>() / self.values.len() as f32)
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

/// Exponential moving average: `new = (1 - alpha) * old + alpha * sample`.
#[derive(Debug, Clone, Copy)]
pub struct Ema {
    alpha: f32,
    value: Option<f32>,
}

impl Ema {
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            value: None,
        }
    }

    pub fn seeded(alpha: f32, seed: f32) -> Self {
        let mut ema = Self::new(alpha);
        ema.value = Some(seed);
        ema
    }

    /// Fold in a sample. An unseeded EMA takes the sample as its value.
    pub fn update(&mut self, sample: f32) -> f32 {
        let next = match self.value {
            Some(old) => (1.0 - self.alpha) * old + self.alpha * sample,
            None => sample,
        };
        self.value = Some(next);
        next
    }

    pub fn value(&self) -> Option<f32> {
        self.value
    }

    pub fn reseed(&mut self, seed: Option<f32>) {
        self.value = seed;
    }
}
