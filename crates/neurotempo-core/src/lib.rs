//! Neurotempo core: worn-state gating, focus/fatigue scoring and break policy.
//!
//! The DSP lives in `neurotempo-signals`; this crate owns everything with
//! session state. `Pipeline::tick` is the single entry point a host drives
//! once per second; it never blocks and never fails.

// Allowed lints, each deliberate:
// - too_many_arguments: status classification takes the full policy view
// - manual_clamp: min/max chains read closer to the threshold formulas
// - new_without_default: constructors take required configuration
#![allow(clippy::too_many_arguments)]
#![allow(clippy::manual_clamp)]
#![allow(clippy::new_without_default)]

pub mod calibration;
pub mod clock;
pub mod config;
pub mod error;
pub mod metrics;
pub mod notify;
pub mod pipeline;
pub mod policy;
pub mod scoring;
pub mod smoothing;
pub mod source;
pub mod status;
pub mod summary;
pub mod worn;

#[cfg(test)]
mod tests_config;
#[cfg(test)]
mod tests_proptest;

// Configuration
pub use config::{
    AcquisitionConfig, CalibrationConfig, ConfigError, ContactConfig, NeurotempoConfig,
    PolicyConfig, ScoringConfig, SmoothingConfig, WornConfig,
};

// Session pipeline
pub use error::PipelineError;
pub use pipeline::{MissReason, Pipeline, TickOutcome, TickReport};

// Per-tick outputs
pub use metrics::MetricsSnapshot;
pub use status::SessionStatus;
pub use summary::{SessionStats, SessionSummary};

// Scoring
pub use scoring::{FocusFatigueScorer, LinearWeights, NoiseGate, ScoreOutcome, ScoringStrategy};
pub use smoothing::{Ema, TrailingMean};

// Worn state
pub use worn::{HoldOutcome, WornRule, WornState, WornStatus, WornTracker, WornTrackerConfig};

// Break policy
pub use notify::{BreakNotifier, LogNotifier};
pub use policy::{
    BreakEvent, BreakPolicyEngine, BreakPolicyState, PolicyPhase, BREAK_MESSAGE, BREAK_TITLE,
};

// Sources and timing
pub use calibration::Calibrator;
pub use clock::{ClockError, SessionClock};
pub use source::{FrozenSource, Scenario, ScriptStep, SignalSource, SimulatedHeadset};
