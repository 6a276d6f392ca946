//! DSP (Digital Signal Processing) module
//!
//! - `SpectralAnalyzer` - periodogram and Welch PSD with a cached FFT planner
//! - `Spectrum` - band integration and interpolated peak picking
//! - `stats` - std, peak-to-peak and repeated-sample ratio

mod spectral;
pub mod stats;

pub use spectral::{detrend_constant, SpectralAnalyzer, Spectrum, WindowFunction};
