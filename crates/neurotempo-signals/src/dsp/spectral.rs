//! Spectral estimation: window functions, detrending, periodogram and
//! Welch-averaged power spectral density, band integration and peak picking.

use num_complex::Complex32;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Taper applied before the FFT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowFunction {
    Rectangular,
    Hann,
    Hamming,
}

impl WindowFunction {
    /// Window coefficients of length `size`.
    pub fn coefficients(self, size: usize) -> Vec<f32> {
        if size < 2 {
            return vec![1.0; size];
        }
        let denom = (size - 1) as f32;
        (0..size)
            .map(|i| {
                let phase = 2.0 * PI * i as f32 / denom;
                match self {
                    WindowFunction::Rectangular => 1.0,
                    WindowFunction::Hann => 0.5 - 0.5 * phase.cos(),
                    WindowFunction::Hamming => 0.54 - 0.46 * phase.cos(),
                }
            })
            .collect()
    }
}

/// Remove the mean (constant detrend).
pub fn detrend_constant(signal: &[f32]) -> Vec<f32> {
    if signal.is_empty() {
        return Vec::new();
    }
    let mean = signal.iter().sum::<f32>() / signal.len() as f32;
    signal.iter().map(|v| v - mean).collect()
}

/// One-sided power spectrum with uniform bin spacing.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    /// Frequency spacing between bins (Hz)
    pub bin_hz: f32,
    /// Power per bin, index 0 = DC
    pub power: Vec<f32>,
}

impl Spectrum {
    pub fn frequency(&self, bin: usize) -> f32 {
        bin as f32 * self.bin_hz
    }

    pub fn nyquist(&self) -> f32 {
        self.frequency(self.power.len().saturating_sub(1))
    }

    /// Integrated power over `[lo_hz, hi_hz)`.
    pub fn band_power(&self, lo_hz: f32, hi_hz: f32) -> f32 {
        self.power
            .iter()
            .enumerate()
            .filter(|(k, _)| {
                let f = self.frequency(*k);
                f >= lo_hz && f < hi_hz
            })
            .map(|(_, p)| p * self.bin_hz)
            .sum()
    }

    /// Frequency (Hz) of the strongest bin within `[lo_hz, hi_hz]`, refined
    /// by parabolic interpolation. `None` if the band holds no bins or no
    /// power.
    pub fn peak_in(&self, lo_hz: f32, hi_hz: f32) -> Option<f32> {
        if self.power.is_empty() || self.bin_hz <= 0.0 {
            return None;
        }
        let last = self.power.len() - 1;
        let min_bin = (lo_hz / self.bin_hz).ceil().max(0.0) as usize;
        let max_bin = ((hi_hz / self.bin_hz).floor() as usize).min(last);
        if min_bin > max_bin {
            return None;
        }

        let mut peak_bin = min_bin;
        let mut max_power = 0.0f32;
        for k in min_bin..=max_bin {
            if self.power[k] > max_power {
                max_power = self.power[k];
                peak_bin = k;
            }
        }
        if !(max_power > 0.0) {
            return None;
        }

        // Parabolic interpolation for sub-bin accuracy
        let refined = if peak_bin > 0 && peak_bin < last {
            let y_m1 = self.power[peak_bin - 1];
            let y_0 = self.power[peak_bin];
            let y_p1 = self.power[peak_bin + 1];
            let denom = y_m1 - 2.0 * y_0 + y_p1;
            if denom.abs() > 1e-12 {
                let delta = 0.5 * (y_m1 - y_p1) / denom;
                if delta.is_finite() && delta.abs() <= 1.0 {
                    peak_bin as f32 + delta
                } else {
                    peak_bin as f32
                }
            } else {
                peak_bin as f32
            }
        } else {
            peak_bin as f32
        };

        Some(refined * self.bin_hz)
    }
}

/// Reusable FFT planner for periodogram / Welch estimates.
pub struct SpectralAnalyzer {
    fft_planner: FftPlanner<f32>,
}

impl SpectralAnalyzer {
    pub fn new() -> Self {
        Self {
            fft_planner: FftPlanner::new(),
        }
    }

    /// Single windowed periodogram of a detrended copy of `signal`.
    ///
    /// # Arguments
    /// * `signal` - input samples
    /// * `fs` - sample rate (Hz)
    /// * `window` - taper applied after detrending
    /// * `fft_len` - zero-padded FFT size; `None` uses the next power of two
    pub fn periodogram(
        &mut self,
        signal: &[f32],
        fs: f32,
        window: WindowFunction,
        fft_len: Option<usize>,
    ) -> Spectrum {
        let n = signal.len();
        if n < 2 || fs <= 0.0 {
            return Spectrum {
                bin_hz: 0.0,
                power: Vec::new(),
            };
        }
        let nfft = fft_len.unwrap_or_else(|| n.next_power_of_two()).max(n);

        let detrended = detrend_constant(signal);
        let taper = window.coefficients(n);
        let taper_energy: f32 = taper.iter().map(|w| w * w).sum();

        let mut buffer: Vec<Complex32> = detrended
            .iter()
            .zip(taper.iter())
            .map(|(s, w)| Complex32::new(s * w, 0.0))
            .collect();
        buffer.resize(nfft, Complex32::new(0.0, 0.0));

        let fft = self.fft_planner.plan_fft_forward(nfft);
        fft.process(&mut buffer);

        let half = nfft / 2;
        let scale = 1.0 / (fs * taper_energy.max(f32::EPSILON));
        let power = buffer
            .iter()
            .take(half + 1)
            .enumerate()
            .map(|(k, c)| {
                let p = c.norm_sqr() * scale;
                // one-sided: fold negative frequencies except DC and Nyquist
                if k == 0 || (nfft % 2 == 0 && k == half) {
                    p
                } else {
                    2.0 * p
                }
            })
            .collect();

        Spectrum {
            bin_hz: fs / nfft as f32,
            power,
        }
    }

    /// Welch PSD: Hann-windowed segments of `segment_len` samples with
    /// `overlap` fraction, each segment detrended, periodograms averaged.
    pub fn welch(&mut self, signal: &[f32], fs: f32, segment_len: usize, overlap: f32) -> Spectrum {
        let n = signal.len();
        let seg = segment_len.clamp(2, n.max(2));
        if n < seg {
            return self.periodogram(signal, fs, WindowFunction::Hann, None);
        }
        let step = ((seg as f32 * (1.0 - overlap.clamp(0.0, 0.95))).round() as usize).max(1);

        let mut acc: Option<Spectrum> = None;
        let mut count = 0usize;
        let mut start = 0usize;
        while start + seg <= n {
            let psd = self.periodogram(&signal[start..start + seg], fs, WindowFunction::Hann, Some(seg));
            match acc.as_mut() {
                Some(total) => {
                    for (t, p) in total.power.iter_mut().zip(psd.power.iter()) {
                        *t += p;
                    }
                }
                None => acc = Some(psd),
            }
            count += 1;
            start += step;
        }

        match acc {
            Some(mut total) => {
                let inv = 1.0 / count as f32;
                total.power.iter_mut().for_each(|p| *p *= inv);
                total
            }
            None => Spectrum {
                bin_hz: 0.0,
                power: Vec::new(),
            },
        }
    }
}

impl Default for SpectralAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sine(freq: f32, fs: f32, n: usize, amp: f32) -> Vec<f32> {
        (0..n)
            .map(|i| amp * (2.0 * PI * freq * i as f32 / fs).sin())
            .collect()
    }

    #[test]
    fn test_window_shapes() {
        let hann = WindowFunction::Hann.coefficients(5);
        assert_relative_eq!(hann[0], 0.0, epsilon = 1e-6);
        assert_relative_eq!(hann[2], 1.0, epsilon = 1e-6);
        let hamming = WindowFunction::Hamming.coefficients(5);
        assert_relative_eq!(hamming[0], 0.08, epsilon = 1e-6);
    }

    #[test]
    fn test_detrend_removes_offset() {
        let d = detrend_constant(&[10.0, 12.0, 14.0]);
        assert_relative_eq!(d.iter().sum::<f32>(), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_periodogram_peak() {
        let fs = 256.0;
        let signal = sine(10.0, fs, 512, 1.0);
        let mut analyzer = SpectralAnalyzer::new();
        let psd = analyzer.periodogram(&signal, fs, WindowFunction::Hann, None);
        let peak = psd.peak_in(1.0, 40.0).unwrap();
        assert!((peak - 10.0).abs() < 0.1, "peak at {}", peak);
    }

    #[test]
    fn test_dc_offset_does_not_dominate() {
        let fs = 128.0;
        let signal: Vec<f32> = sine(6.0, fs, 256, 1.0).iter().map(|v| v + 500.0).collect();
        let mut analyzer = SpectralAnalyzer::new();
        let psd = analyzer.welch(&signal, fs, 128, 0.5);
        assert!(psd.band_power(4.0, 8.0) > 10.0 * psd.band_power(0.0, 1.0));
    }

    #[test]
    fn test_welch_band_power_concentrated() {
        let fs = 256.0;
        let signal = sine(20.0, fs, 512, 2.0);
        let mut analyzer = SpectralAnalyzer::new();
        let psd = analyzer.welch(&signal, fs, 256, 0.5);
        let beta = psd.band_power(13.0, 30.0);
        let total = psd.band_power(1.0, 50.0);
        assert!(beta / total > 0.95);
    }

    #[test]
    fn test_empty_band_has_no_peak() {
        let mut analyzer = SpectralAnalyzer::new();
        let psd = analyzer.periodogram(&[0.0; 64], 64.0, WindowFunction::Hann, None);
        assert!(psd.peak_in(0.8, 3.0).is_none());
    }
}
