use thiserror::Error;

use neurotempo_signals::{FrameError, MontageError};

use crate::config::ConfigError;

/// Failures constructing a pipeline or its simulated source. Ticks never
/// fail; transient conditions are reported in the tick outcome instead.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("electrode map error: {0}")]
    Montage(#[from] MontageError),
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
    #[error("baseline focus must be in [0, 1], got {0}")]
    Baseline(f32),
}
