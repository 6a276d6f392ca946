//! Heart rate and SpO2 from the headset's PPG channels.
//!
//! Both estimates are best-effort. A reading that cannot be computed is
//! reported as `None`, never replaced by a plausible default.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::dsp::{stats, SpectralAnalyzer, WindowFunction};
use crate::frame::{ChannelRole, RawFrame};

/// Configuration for vitals estimation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VitalsConfig {
    /// Physiological search band for the pulse peak (Hz)
    pub hr_band_hz: (f32, f32),
    /// Absolute sane range for a heart-rate reading (bpm)
    pub min_bpm: f32,
    pub max_bpm: f32,
    /// Shortest PPG window accepted (s)
    pub min_window_s: f32,
    /// Zero-padding factor before the FFT
    pub zero_pad: usize,
    /// Linear calibration `spo2 = a - b * R`
    pub spo2_a: f32,
    pub spo2_b: f32,
    pub spo2_min: f32,
    pub spo2_max: f32,
    /// Valid readings averaged into the reported value
    pub smoothing_len: usize,
}

impl Default for VitalsConfig {
    fn default() -> Self {
        Self {
            hr_band_hz: (0.8, 3.0),
            min_bpm: 30.0,
            max_bpm: 220.0,
            min_window_s: 2.0,
            zero_pad: 8,
            spo2_a: 110.0,
            spo2_b: 25.0,
            spo2_min: 70.0,
            spo2_max: 100.0,
            smoothing_len: 4,
        }
    }
}

/// Optional vitals for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vitals {
    pub heart_rate: Option<u32>,
    pub spo2: Option<u32>,
}

pub struct VitalsEstimator {
    config: VitalsConfig,
    analyzer: SpectralAnalyzer,
    hr_history: VecDeque<f32>,
    spo2_history: VecDeque<f32>,
}

impl VitalsEstimator {
    pub fn new() -> Self {
        Self::with_config(VitalsConfig::default())
    }

    pub fn with_config(config: VitalsConfig) -> Self {
        Self {
            config,
            analyzer: SpectralAnalyzer::new(),
            hr_history: VecDeque::new(),
            spo2_history: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &VitalsConfig {
        &self.config
    }

    /// Heart rate (bpm) from a single PPG channel.
    ///
    /// Detrend, Hann window, zero-padded power spectrum, interpolated peak in
    /// `hr_band_hz`. `None` if the window is too short, the band holds no
    /// power, or the peak falls outside `[min_bpm, max_bpm]`.
    pub fn heart_rate(&mut self, ppg: &[f32], fs: f32) -> Option<f32> {
        let n = ppg.len();
        if fs <= 0.0 || (n as f32) < self.config.min_window_s * fs {
            return None;
        }
        let nfft = (n * self.config.zero_pad.max(1)).next_power_of_two();
        let spectrum = self
            .analyzer
            .periodogram(ppg, fs, WindowFunction::Hann, Some(nfft));
        let (lo, hi) = self.config.hr_band_hz;
        let bpm = spectrum.peak_in(lo, hi)? * 60.0;

        if bpm < self.config.min_bpm || bpm > self.config.max_bpm {
            log::trace!("heart rate {:.1} bpm outside sane range", bpm);
            return None;
        }
        Some(bpm)
    }

    /// SpO2 (%) by ratio of ratios, AC = std and DC = mean per wavelength.
    pub fn spo2(&self, ir: &[f32], red: &[f32], fs: f32) -> Option<f32> {
        if ir.len() != red.len() || fs <= 0.0 || (ir.len() as f32) < self.config.min_window_s * fs {
            return None;
        }
        let (dc_ir, dc_red) = (stats::mean(ir), stats::mean(red));
        let (ac_ir, ac_red) = (stats::std(ir), stats::std(red));
        if dc_ir <= 0.0 || dc_red <= 0.0 || ac_ir <= 0.0 || ac_red <= 0.0 {
            return None;
        }
        let ratio = (ac_red / dc_red) / (ac_ir / dc_ir);
        let spo2 = self.config.spo2_a - self.config.spo2_b * ratio;

        if !spo2.is_finite() || spo2 < self.config.spo2_min || spo2 > self.config.spo2_max {
            log::trace!("spo2 {:.1}% outside accepted range (R={:.3})", spo2, ratio);
            return None;
        }
        Some(spo2)
    }

    /// Estimate both vitals from a frame's PPG rows.
    ///
    /// IR carries the pulse for heart rate; SpO2 needs IR and red. When an
    /// ambient row is present it is subtracted from both. Valid readings are
    /// averaged over the last `smoothing_len` valid ticks, but a tick whose
    /// own reading is invalid reports `None`.
    pub fn update(&mut self, frame: &RawFrame) -> Vitals {
        let fs = frame.sampling_rate();
        let ambient = frame.channel(ChannelRole::PpgAmbient);
        let corrected = |row: Option<Vec<f32>>| -> Option<Vec<f32>> {
            let mut row = row?;
            if let Some(amb) = ambient.as_ref() {
                for (v, a) in row.iter_mut().zip(amb.iter()) {
                    *v -= a;
                }
            }
            Some(row)
        };
        let ir = corrected(frame.channel(ChannelRole::PpgIr));
        let red = corrected(frame.channel(ChannelRole::PpgRed));

        let hr = ir.as_deref().and_then(|ir| self.heart_rate(ir, fs));
        let spo2 = match (ir.as_deref(), red.as_deref()) {
            (Some(ir), Some(red)) => self.spo2(ir, red, fs),
            _ => None,
        };

        let cap = self.config.smoothing_len.max(1);
        Vitals {
            heart_rate: hr.map(|v| smoothed(&mut self.hr_history, v, cap)),
            spo2: spo2.map(|v| smoothed(&mut self.spo2_history, v, cap)),
        }
    }

    pub fn reset(&mut self) {
        self.hr_history.clear();
        self.spo2_history.clear();
    }
}

impl Default for VitalsEstimator {
    fn default() -> Self {
        Self::new()
    }
}

fn smoothed(history: &mut VecDeque<f32>, value: f32, cap: usize) -> u32 {
    if history.len() == cap {
        history.pop_front();
    }
    history.push_back(value);
    let mean = history.iter().sum::<f32>() / history.len() as f32;
    mean.round().max(0.0) as u32
}
