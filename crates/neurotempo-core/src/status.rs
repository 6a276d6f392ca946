use serde::{Deserialize, Serialize};

use crate::policy::PolicyPhase;

/// Focus level at or above which the user is told to keep working.
pub const KEEP_WORKING_FOCUS: f32 = 0.65;
/// Focus level at or above which the user is told to take a breath.
pub const TAKE_A_BREATH_FOCUS: f32 = 0.45;

/// One-line session state shown next to the live metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    NotWorn,
    SettlingIn,
    KeepWorking,
    TakeABreath,
    Recovering,
    LowFocusFatigued,
    LowFocusNotFatigued,
}

impl SessionStatus {
    /// Classify from the policy's smoothed view of the session.
    pub fn classify(
        worn: bool,
        phase: PolicyPhase,
        focus_ema: f32,
        fatigue_ema: f32,
        fatigue_gate: f32,
    ) -> Self {
        if !worn {
            return SessionStatus::NotWorn;
        }
        match phase {
            PolicyPhase::Grace => SessionStatus::SettlingIn,
            _ if focus_ema >= KEEP_WORKING_FOCUS => SessionStatus::KeepWorking,
            _ if focus_ema >= TAKE_A_BREATH_FOCUS => SessionStatus::TakeABreath,
            PolicyPhase::Cooldown => SessionStatus::Recovering,
            PolicyPhase::ActiveMonitoring if fatigue_ema >= fatigue_gate => {
                SessionStatus::LowFocusFatigued
            }
            PolicyPhase::ActiveMonitoring => SessionStatus::LowFocusNotFatigued,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SessionStatus::NotWorn => "Headset not worn",
            SessionStatus::SettlingIn => "Settling in…",
            SessionStatus::KeepWorking => "Keep working",
            SessionStatus::TakeABreath => "Take a breath",
            SessionStatus::Recovering => "Recovering (cooldown)",
            SessionStatus::LowFocusFatigued => "Focus low + fatigue rising",
            SessionStatus::LowFocusNotFatigued => "Low focus (not fatigued)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_order() {
        use PolicyPhase::*;
        assert_eq!(SessionStatus::classify(false, ActiveMonitoring, 0.9, 0.0, 0.45), SessionStatus::NotWorn);
        assert_eq!(SessionStatus::classify(true, Grace, 0.1, 0.9, 0.45), SessionStatus::SettlingIn);
        assert_eq!(SessionStatus::classify(true, Cooldown, 0.7, 0.9, 0.45), SessionStatus::KeepWorking);
        assert_eq!(SessionStatus::classify(true, ActiveMonitoring, 0.5, 0.9, 0.45), SessionStatus::TakeABreath);
        assert_eq!(SessionStatus::classify(true, Cooldown, 0.3, 0.9, 0.45), SessionStatus::Recovering);
        assert_eq!(
            SessionStatus::classify(true, ActiveMonitoring, 0.3, 0.45, 0.45),
            SessionStatus::LowFocusFatigued
        );
        assert_eq!(
            SessionStatus::classify(true, ActiveMonitoring, 0.3, 0.2, 0.45),
            SessionStatus::LowFocusNotFatigued
        );
    }
}
