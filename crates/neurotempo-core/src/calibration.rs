//! Baseline focus calibration.

/// Collects accepted focus samples and yields `baseline = clamp01(mean)`.
#[derive(Debug, Clone)]
pub struct Calibrator {
    target: usize,
    samples: Vec<f32>,
}

impl Calibrator {
    /// # Arguments
    /// * `target_samples` - accepted ticks to collect (one per second at the default tick)
    pub fn new(target_samples: u32) -> Self {
        let target = target_samples.max(1) as usize;
        Self {
            target,
            samples: Vec::with_capacity(target),
        }
    }

    /// Add one focus sample. Ignored once complete.
    pub fn push(&mut self, focus: f32) {
        if !self.is_complete() && focus.is_finite() {
            self.samples.push(focus);
        }
    }

    /// Fraction collected, in [0, 1].
    pub fn progress(&self) -> f32 {
        (self.samples.len() as f32 / self.target as f32).min(1.0)
    }

    pub fn is_complete(&self) -> bool {
        self.samples.len() >= self.target
    }

    /// Baseline once every sample is in.
    pub fn baseline(&self) -> Option<f32> {
        if self.is_complete() {
            self.current_mean()
        } else {
            None
        }
    }

    /// Baseline from whatever was collected so far (early stop).
    pub fn current_mean(&self) -> Option<f32> {
        if self.samples.is_empty() {
            return None;
        }
        let mean = self.samples.iter().sum::<f32>() / self.samples.len() as f32;
        Some(mean.clamp(0.0, 1.0))
    }

    pub fn reset(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_after_target() {
        let mut c = Calibrator::new(4);
        for f in [0.5, 0.7, 0.6] {
            c.push(f);
        }
        assert!(c.baseline().is_none());
        assert!((c.progress() - 0.75).abs() < 1e-6);
        c.push(0.6);
        c.push(0.0); // ignored, already complete
        assert!((c.baseline().unwrap() - 0.6).abs() < 1e-6);
        assert_eq!(c.progress(), 1.0);
    }

    #[test]
    fn test_empty_has_no_baseline() {
        let c = Calibrator::new(30);
        assert!(c.current_mean().is_none());
    }
}
