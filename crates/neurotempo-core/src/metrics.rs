use serde::{Deserialize, Serialize};

use neurotempo_signals::Vitals;

/// Externally visible output of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Smoothed focus in [0, 1]
    pub focus: f32,
    /// Smoothed fatigue in [0, 1]
    pub fatigue: f32,
    /// bpm, `None` when not measurable
    pub heart_rate: Option<u32>,
    /// percent, `None` when not measurable
    pub spo2: Option<u32>,
}

impl MetricsSnapshot {
    pub fn new(focus: f32, fatigue: f32, vitals: Vitals) -> Self {
        Self {
            focus: focus.clamp(0.0, 1.0),
            fatigue: fatigue.clamp(0.0, 1.0),
            heart_rate: vitals.heart_rate,
            spo2: vitals.spo2,
        }
    }

    /// The "not worn / unavailable" snapshot.
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }
}
