//! # neurotempo-signals
//!
//! Signal processing for the Neurotempo headset pipeline.
//!
//! This crate provides:
//! - **Frames**: `RawFrame`, channel roles and the `SampleBuffer` window store
//! - **DSP**: window functions, detrend, periodogram and Welch PSD
//! - **Contact quality**: per-electrode validity from window statistics
//! - **Band powers**: relative delta/theta/alpha/beta/gamma power
//! - **Vitals**: heart rate and SpO2 from PPG
//!
//! ## Example
//!
//! ```ignore
//! use neurotempo_signals::{BandPowerExtractor, ContactQualityEstimator, ElectrodeMap};
//!
//! let eeg = frame.eeg();
//! let report = ContactQualityEstimator::new(ElectrodeMap::identity())
//!     .estimate(eeg.view(), frame.sampling_rate());
//! if report.passing_count() > 0 {
//!     let bands = BandPowerExtractor::new().extract(eeg.view(), &[0, 1, 2, 3], 256.0);
//! }
//! ```

pub mod bands;
pub mod dsp;
pub mod frame;
pub mod montage;
pub mod quality;
pub mod vitals;

pub use bands::{BandPowerConfig, BandPowerExtractor, BandPowers};
pub use frame::{
    samples_for, ChannelLayout, ChannelRole, FrameError, NotReadyReason, RawFrame, SampleBuffer,
    Window, WindowSlice,
};
pub use montage::{Electrode, ElectrodeMap, MontageError};
pub use quality::{
    ChannelFault, ChannelQuality, ChannelStats, ContactQualityConfig, ContactQualityEstimator,
    ContactReport, ContactScoring, QualityCondition, GREEN_THRESHOLD,
};
pub use vitals::{Vitals, VitalsConfig, VitalsEstimator};
