//! Per-electrode contact quality from EEG window statistics.
//!
//! A pure per-window classifier: every call looks only at the window it is
//! given. Temporal stability (debounce, warm-up, hold) is layered on top by
//! the worn-state tracker in `neurotempo-core`.

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use crate::dsp::{stats, SpectralAnalyzer, WindowFunction};
use crate::montage::{Electrode, ElectrodeMap};

/// Score at or above which an electrode counts as "green".
pub const GREEN_THRESHOLD: f32 = 0.5;

/// How a channel that passes every gate is scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactScoring {
    /// 1.0 when every gate passes, else 0.0
    Binary,
    /// Linear in std between `good_std` (1.0) and `bad_std` (0.0)
    Graded,
}

/// Thresholds for contact quality. Amplitudes are in the headset's raw units
/// (microvolts for the reference hardware).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactQualityConfig {
    pub std_low: f32,
    pub std_high: f32,
    pub ptp_low: f32,
    pub ptp_high: f32,
    /// Mains interference band (Hz)
    pub line_band_hz: (f32, f32),
    /// Reference band the line power is compared against (Hz)
    pub reference_band_hz: (f32, f32),
    pub max_line_noise_ratio: f32,
    pub max_repeat_ratio: f32,
    /// Adjacent samples closer than this count as repeats
    pub repeat_epsilon: f32,
    /// Std far above `std_high` that marks desk/off-head noise
    pub extreme_std: f32,
    /// Channels at `extreme_std` needed to force every channel red
    pub extreme_quorum: usize,
    pub scoring: ContactScoring,
    pub good_std: f32,
    pub bad_std: f32,
}

impl Default for ContactQualityConfig {
    fn default() -> Self {
        Self {
            std_low: 0.5,
            std_high: 80.0,
            ptp_low: 2.0,
            ptp_high: 500.0,
            line_band_hz: (59.0, 61.0),
            reference_band_hz: (1.0, 40.0),
            max_line_noise_ratio: 0.35,
            max_repeat_ratio: 0.2,
            repeat_epsilon: 1e-6,
            extreme_std: 250.0,
            extreme_quorum: 3,
            scoring: ContactScoring::Binary,
            good_std: 25.0,
            bad_std: 80.0,
        }
    }
}

/// Window statistics for one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub std: f32,
    pub peak_to_peak: f32,
    pub line_noise_ratio: f32,
    pub repeat_ratio: f32,
}

/// Why a channel was scored red.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelFault {
    Missing,
    StdTooLow,
    StdTooHigh,
    PtpTooLow,
    PtpTooHigh,
    LineNoise,
    Repeats,
    GlobalNoise,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelQuality {
    pub electrode: Electrode,
    /// Score in [0, 1]
    pub score: f32,
    pub stats: ChannelStats,
    pub faults: Vec<ChannelFault>,
}

impl ChannelQuality {
    pub fn passes(&self) -> bool {
        self.score >= GREEN_THRESHOLD
    }
}

/// Report-level condition alongside the per-channel scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityCondition {
    Ok,
    /// Fewer EEG rows than the montage needs; every channel fails closed
    NotEnoughChannels { have: usize, need: usize },
    /// Too many channels at extreme amplitude; every channel forced red
    GlobalNoise { extreme_channels: usize },
}

/// Contact quality for one window, one entry per electrode in canonical order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactReport {
    pub channels: Vec<ChannelQuality>,
    pub condition: QualityCondition,
}

impl ContactReport {
    /// All electrodes red with the given fault.
    pub fn all_red(condition: QualityCondition, fault: ChannelFault) -> Self {
        Self {
            channels: Electrode::CANONICAL
                .iter()
                .map(|&electrode| ChannelQuality {
                    electrode,
                    score: 0.0,
                    stats: ChannelStats::default(),
                    faults: vec![fault],
                })
                .collect(),
            condition,
        }
    }

    pub fn scores(&self) -> Vec<f32> {
        self.channels.iter().map(|c| c.score).collect()
    }

    pub fn passing_count(&self) -> usize {
        self.channels.iter().filter(|c| c.passes()).count()
    }

    pub fn get(&self, electrode: Electrode) -> Option<&ChannelQuality> {
        self.channels.iter().find(|c| c.electrode == electrode)
    }

    /// Repositioning hints for every red electrode, canonical order.
    pub fn tips(&self) -> Vec<&'static str> {
        self.channels
            .iter()
            .filter(|c| !c.passes())
            .map(|c| c.electrode.contact_tip())
            .collect()
    }
}

pub struct ContactQualityEstimator {
    config: ContactQualityConfig,
    map: ElectrodeMap,
    analyzer: SpectralAnalyzer,
}

impl ContactQualityEstimator {
    pub fn new(map: ElectrodeMap) -> Self {
        Self::with_config(ContactQualityConfig::default(), map)
    }

    pub fn with_config(config: ContactQualityConfig, map: ElectrodeMap) -> Self {
        Self {
            config,
            map,
            analyzer: SpectralAnalyzer::new(),
        }
    }

    pub fn config(&self) -> &ContactQualityConfig {
        &self.config
    }

    /// Score every electrode of an EEG window (rows in raw hardware order).
    pub fn estimate(&mut self, eeg: ArrayView2<'_, f32>, fs: f32) -> ContactReport {
        let need = Electrode::CANONICAL.len();
        let have = eeg.nrows();
        if have < need || self.map.iter().any(|(_, row)| row >= have) {
            log::debug!("contact quality: {} EEG rows, need {}", have, need);
            return ContactReport::all_red(
                QualityCondition::NotEnoughChannels { have, need },
                ChannelFault::Missing,
            );
        }

        let pairs: Vec<(Electrode, usize)> = self.map.iter().collect();
        let mut channels = Vec::with_capacity(need);
        for (electrode, row) in pairs {
            let samples: Vec<f32> = eeg.row(row).to_vec();
            let stats = self.channel_stats(&samples, fs);
            let faults = self.gate(&stats);
            let score = if faults.is_empty() {
                self.score(&stats)
            } else {
                0.0
            };
            channels.push(ChannelQuality {
                electrode,
                score,
                stats,
                faults,
            });
        }

        let extreme_channels = channels
            .iter()
            .filter(|c| c.stats.std > self.config.extreme_std)
            .count();
        let condition = if extreme_channels >= self.config.extreme_quorum {
            log::debug!(
                "contact quality: {} channels above extreme std, forcing all red",
                extreme_channels
            );
            for channel in channels.iter_mut() {
                channel.score = 0.0;
                channel.faults.push(ChannelFault::GlobalNoise);
            }
            QualityCondition::GlobalNoise { extreme_channels }
        } else {
            QualityCondition::Ok
        };

        ContactReport {
            channels,
            condition,
        }
    }

    fn channel_stats(&mut self, samples: &[f32], fs: f32) -> ChannelStats {
        ChannelStats {
            std: stats::std(samples),
            peak_to_peak: stats::peak_to_peak(samples),
            line_noise_ratio: self.line_noise_ratio(samples, fs),
            repeat_ratio: stats::repeat_ratio(samples, self.config.repeat_epsilon),
        }
    }

    fn line_noise_ratio(&mut self, samples: &[f32], fs: f32) -> f32 {
        let (line_lo, line_hi) = self.config.line_band_hz;
        // mains band not observable at this rate
        if line_lo >= fs / 2.0 {
            return 0.0;
        }
        let spectrum = self
            .analyzer
            .periodogram(samples, fs, WindowFunction::Hann, None);
        let line = spectrum.band_power(line_lo, line_hi);
        let (ref_lo, ref_hi) = self.config.reference_band_hz;
        let reference = spectrum.band_power(ref_lo, ref_hi);
        if line <= 0.0 {
            0.0
        } else {
            line / reference.max(1e-12)
        }
    }

    fn gate(&self, s: &ChannelStats) -> Vec<ChannelFault> {
        let c = &self.config;
        let mut faults = Vec::new();
        if s.std < c.std_low {
            faults.push(ChannelFault::StdTooLow);
        }
        if s.std > c.std_high {
            faults.push(ChannelFault::StdTooHigh);
        }
        if s.peak_to_peak < c.ptp_low {
            faults.push(ChannelFault::PtpTooLow);
        }
        if s.peak_to_peak > c.ptp_high {
            faults.push(ChannelFault::PtpTooHigh);
        }
        if s.line_noise_ratio > c.max_line_noise_ratio {
            faults.push(ChannelFault::LineNoise);
        }
        if s.repeat_ratio > c.max_repeat_ratio {
            faults.push(ChannelFault::Repeats);
        }
        faults
    }

    fn score(&self, s: &ChannelStats) -> f32 {
        match self.config.scoring {
            ContactScoring::Binary => 1.0,
            ContactScoring::Graded => {
                let (good, bad) = (self.config.good_std, self.config.bad_std);
                if s.std <= good {
                    1.0
                } else if s.std >= bad {
                    0.0
                } else {
                    1.0 - (s.std - good) / (bad - good)
                }
            }
        }
    }
}
