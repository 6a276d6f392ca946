//! Break recommendation policy.
//!
//! A session starts in `Grace`. Afterwards the engine is in
//! `ActiveMonitoring` unless a break fired less than `cooldown_s` ago
//! (`Cooldown`). Only in `ActiveMonitoring` does a streak of
//! low-focus-and-fatigued ticks build up; any other tick resets it. A streak
//! lasting `sustained_low_required_s` fires one break and starts the cooldown.

use serde::{Deserialize, Serialize};

use crate::config::PolicyConfig;

pub const BREAK_TITLE: &str = "Neurotempo";
pub const BREAK_MESSAGE: &str =
    "Focus stayed low and fatigue is building. Take a 2–5 minute reset break.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyPhase {
    Grace,
    ActiveMonitoring,
    Cooldown,
}

/// Break policy bookkeeping; times are session-clock seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakPolicyState {
    pub session_start: f64,
    /// Duration of the current low streak
    pub low_seconds: f64,
    /// Start of the current low streak
    pub low_since: Option<f64>,
    pub last_break_at: Option<f64>,
    pub breaks: u32,
}

impl BreakPolicyState {
    pub fn new(session_start: f64) -> Self {
        Self {
            session_start,
            low_seconds: 0.0,
            low_since: None,
            last_break_at: None,
            breaks: 0,
        }
    }
}

/// Payload handed to the notification collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakEvent {
    pub title: String,
    pub message: String,
    /// Session-clock time the break fired
    pub at_s: f64,
    /// 1-based count of breaks this session
    pub break_index: u32,
}

pub struct BreakPolicyEngine {
    config: PolicyConfig,
    baseline_focus: f32,
    state: BreakPolicyState,
}

impl BreakPolicyEngine {
    pub fn new(config: PolicyConfig, baseline_focus: f32, session_start: f64) -> Self {
        Self {
            config,
            baseline_focus: baseline_focus.clamp(0.0, 1.0),
            state: BreakPolicyState::new(session_start),
        }
    }

    /// `clamp(baseline * multiplier, min, max)`
    pub fn low_threshold(&self) -> f32 {
        (self.baseline_focus * self.config.threshold_multiplier)
            .max(self.config.threshold_min)
            .min(self.config.threshold_max)
    }

    pub fn fatigue_gate(&self) -> f32 {
        self.config.fatigue_gate
    }

    pub fn baseline_focus(&self) -> f32 {
        self.baseline_focus
    }

    pub fn phase(&self, now: f64) -> PolicyPhase {
        if now - self.state.session_start < self.config.grace_period_s as f64 {
            return PolicyPhase::Grace;
        }
        match self.state.last_break_at {
            Some(at) if now - at < self.config.cooldown_s as f64 => PolicyPhase::Cooldown,
            _ => PolicyPhase::ActiveMonitoring,
        }
    }

    /// Feed one tick of smoothed scores. Returns the break event if one fires.
    pub fn observe(&mut self, now: f64, focus: f32, fatigue: f32) -> Option<BreakEvent> {
        if self.phase(now) != PolicyPhase::ActiveMonitoring {
            self.clear_streak();
            return None;
        }

        let low_and_fatigued = focus < self.low_threshold() && fatigue >= self.config.fatigue_gate;
        if !low_and_fatigued {
            self.clear_streak();
            return None;
        }

        let since = *self.state.low_since.get_or_insert(now);
        self.state.low_seconds = now - since;
        log::trace!(
            "low streak {:.0}s (focus={:.2} fatigue={:.2})",
            self.state.low_seconds,
            focus,
            fatigue
        );

        if self.state.low_seconds < self.config.sustained_low_required_s as f64 {
            return None;
        }

        self.clear_streak();
        self.state.last_break_at = Some(now);
        self.state.breaks += 1;
        log::info!(
            "break #{} fired at {:.0}s into session",
            self.state.breaks,
            now - self.state.session_start
        );
        Some(BreakEvent {
            title: BREAK_TITLE.to_string(),
            message: BREAK_MESSAGE.to_string(),
            at_s: now,
            break_index: self.state.breaks,
        })
    }

    /// Break the current low streak (signal lost or output went to zero).
    pub fn interrupt(&mut self) {
        if self.state.low_since.is_some() {
            log::debug!("low streak interrupted after {:.0}s", self.state.low_seconds);
        }
        self.clear_streak();
    }

    pub fn state(&self) -> &BreakPolicyState {
        &self.state
    }

    /// Start a new session; breaks and streak are forgotten.
    pub fn reset(&mut self, session_start: f64) {
        self.state = BreakPolicyState::new(session_start);
    }

    fn clear_streak(&mut self) {
        self.state.low_since = None;
        self.state.low_seconds = 0.0;
    }
}
