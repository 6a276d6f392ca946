//! Relative EEG band powers over an analysis window.

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use crate::dsp::SpectralAnalyzer;

/// Band edges in Hz, each `[lo, hi)`.
pub const DELTA_HZ: (f32, f32) = (1.0, 4.0);
pub const THETA_HZ: (f32, f32) = (4.0, 8.0);
pub const ALPHA_HZ: (f32, f32) = (8.0, 13.0);
pub const BETA_HZ: (f32, f32) = (13.0, 30.0);
pub const GAMMA_HZ: (f32, f32) = (30.0, 50.0);

/// Five non-negative relative powers summing to ~1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BandPowers {
    pub delta: f32,
    pub theta: f32,
    pub alpha: f32,
    pub beta: f32,
    pub gamma: f32,
}

impl BandPowers {
    pub fn new(delta: f32, theta: f32, alpha: f32, beta: f32, gamma: f32) -> Self {
        Self {
            delta,
            theta,
            alpha,
            beta,
            gamma,
        }
    }

    pub fn total(&self) -> f32 {
        self.delta + self.theta + self.alpha + self.beta + self.gamma
    }

    fn as_array(&self) -> [f32; 5] {
        [self.delta, self.theta, self.alpha, self.beta, self.gamma]
    }

    fn from_array(a: [f32; 5]) -> Self {
        Self::new(a[0], a[1], a[2], a[3], a[4])
    }

    /// Rescaled so the bands sum to 1. `None` when there is no power at all.
    pub fn normalized(&self) -> Option<Self> {
        let total = self.total();
        if !(total > 0.0) || !total.is_finite() {
            return None;
        }
        Some(Self::from_array(self.as_array().map(|p| p / total)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandPowerConfig {
    /// Welch segment length (s)
    pub segment_s: f32,
    /// Segment overlap fraction
    pub overlap: f32,
}

impl Default for BandPowerConfig {
    fn default() -> Self {
        Self {
            segment_s: 1.0,
            overlap: 0.5,
        }
    }
}

/// Welch-based relative band power, averaged over channels.
pub struct BandPowerExtractor {
    config: BandPowerConfig,
    analyzer: SpectralAnalyzer,
}

impl BandPowerExtractor {
    pub fn new() -> Self {
        Self::with_config(BandPowerConfig::default())
    }

    pub fn with_config(config: BandPowerConfig) -> Self {
        Self {
            config,
            analyzer: SpectralAnalyzer::new(),
        }
    }

    /// Relative band powers of the selected rows of `data`.
    ///
    /// Each channel is detrended and Welch-averaged, reduced to relative
    /// powers, then the channels are averaged and renormalized. Channels with
    /// no in-band power (flatlines) are skipped. `None` when no channel has
    /// usable power.
    pub fn extract(
        &mut self,
        data: ArrayView2<'_, f32>,
        channels: &[usize],
        fs: f32,
    ) -> Option<BandPowers> {
        let segment_len = ((self.config.segment_s * fs).round() as usize).max(2);
        let mut sum = [0.0f32; 5];
        let mut used = 0usize;

        for &row in channels {
            if row >= data.nrows() {
                continue;
            }
            let samples = data.row(row).to_vec();
            let spectrum = self
                .analyzer
                .welch(&samples, fs, segment_len, self.config.overlap);
            let absolute = BandPowers::new(
                spectrum.band_power(DELTA_HZ.0, DELTA_HZ.1),
                spectrum.band_power(THETA_HZ.0, THETA_HZ.1),
                spectrum.band_power(ALPHA_HZ.0, ALPHA_HZ.1),
                spectrum.band_power(BETA_HZ.0, BETA_HZ.1),
                spectrum.band_power(GAMMA_HZ.0, GAMMA_HZ.1),
            );
            if let Some(relative) = absolute.normalized() {
                for (acc, p) in sum.iter_mut().zip(relative.as_array()) {
                    *acc += p;
                }
                used += 1;
            }
        }

        if used == 0 {
            return None;
        }
        let mean = sum.map(|s| s / used as f32);
        BandPowers::from_array(mean).normalized()
    }
}

impl Default for BandPowerExtractor {
    fn default() -> Self {
        Self::new()
    }
}
