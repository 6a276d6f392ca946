//! Band powers to bounded focus/fatigue scores.
//!
//! The default strategy is a fixed linear combination of theta, alpha and
//! beta with an offset/scale into [0, 1]. The older ratio form
//! (`beta / (alpha + theta)` and `theta / (alpha + beta)`) is kept as an
//! alternative strategy; only one is active per scorer.
//!
//! Before scoring, a sanity gate rejects beta-dominated windows typical of
//! EMG or motion artifact. A rejected window clears the trailing history and
//! is reported as noise so the caller can hold the previous output.

use serde::{Deserialize, Serialize};

use neurotempo_signals::BandPowers;

use crate::smoothing::TrailingMean;

/// Coefficients of the linear-combination strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearWeights {
    pub focus_beta: f32,
    pub focus_alpha: f32,
    pub focus_theta: f32,
    pub focus_bias: f32,
    pub focus_scale: f32,
    pub fatigue_theta: f32,
    pub fatigue_alpha: f32,
    pub fatigue_beta: f32,
    pub fatigue_bias: f32,
    pub fatigue_scale: f32,
}

impl Default for LinearWeights {
    fn default() -> Self {
        Self {
            focus_beta: 1.15,
            focus_alpha: 0.25,
            focus_theta: 0.90,
            focus_bias: 0.25,
            focus_scale: 0.75,
            fatigue_theta: 1.10,
            fatigue_alpha: 0.20,
            fatigue_beta: 0.60,
            fatigue_bias: 0.10,
            fatigue_scale: 0.70,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoringStrategy {
    LinearCombination(LinearWeights),
    Ratio,
}

impl Default for ScoringStrategy {
    fn default() -> Self {
        ScoringStrategy::LinearCombination(LinearWeights::default())
    }
}

/// Beta-dominance artifact gate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseGate {
    /// Beta above this is suspicious when alpha + theta is also low
    pub beta_dominant: f32,
    pub alpha_theta_floor: f32,
    /// Beta above this is rejected outright
    pub beta_max: f32,
}

impl Default for NoiseGate {
    fn default() -> Self {
        Self {
            beta_dominant: 0.55,
            alpha_theta_floor: 0.20,
            beta_max: 0.75,
        }
    }
}

impl NoiseGate {
    pub fn is_noise(&self, bands: &BandPowers) -> bool {
        (bands.beta > self.beta_dominant && bands.alpha + bands.theta < self.alpha_theta_floor)
            || bands.beta > self.beta_max
    }
}

const RATIO_EPS: f32 = 1e-6;

fn clamp01(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

impl ScoringStrategy {
    /// Instantaneous `(focus, fatigue)` in [0, 1] for one set of band powers.
    pub fn score(&self, b: &BandPowers) -> (f32, f32) {
        match self {
            ScoringStrategy::LinearCombination(w) => {
                let focus_raw = w.focus_beta * b.beta + w.focus_alpha * b.alpha - w.focus_theta * b.theta;
                let fatigue_raw =
                    w.fatigue_theta * b.theta + w.fatigue_alpha * b.alpha - w.fatigue_beta * b.beta;
                (
                    clamp01((focus_raw + w.focus_bias) / w.focus_scale),
                    clamp01((fatigue_raw + w.fatigue_bias) / w.fatigue_scale),
                )
            }
            ScoringStrategy::Ratio => (
                clamp01(b.beta / (b.alpha + b.theta).max(RATIO_EPS)),
                clamp01(b.theta / (b.alpha + b.beta).max(RATIO_EPS)),
            ),
        }
    }
}

/// Outcome of feeding one window of band powers to the scorer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreOutcome {
    /// Smoothed scores (trailing mean including this window)
    Accepted { focus: f32, fatigue: f32 },
    /// Artifact window; history was cleared and nothing was recorded
    Noise,
}

/// Focus/fatigue scorer with noise gate and trailing-mean smoothing.
#[derive(Debug, Clone)]
pub struct FocusFatigueScorer {
    strategy: ScoringStrategy,
    gate: NoiseGate,
    focus_history: TrailingMean,
    fatigue_history: TrailingMean,
}

impl FocusFatigueScorer {
    pub fn new(strategy: ScoringStrategy, gate: NoiseGate, history_len: usize) -> Self {
        Self {
            strategy,
            gate,
            focus_history: TrailingMean::new(history_len),
            fatigue_history: TrailingMean::new(history_len),
        }
    }

    pub fn strategy(&self) -> &ScoringStrategy {
        &self.strategy
    }

    pub fn observe(&mut self, bands: &BandPowers) -> ScoreOutcome {
        if self.gate.is_noise(bands) {
            log::debug!(
                "noise gate rejected window (beta={:.2}, alpha+theta={:.2})",
                bands.beta,
                bands.alpha + bands.theta
            );
            self.reset();
            return ScoreOutcome::Noise;
        }

        let (focus, fatigue) = self.strategy.score(bands);
        let focus = self.focus_history.push(focus);
        let fatigue = self.fatigue_history.push(fatigue);
        log::trace!("scores: focus={:.3} fatigue={:.3}", focus, fatigue);
        ScoreOutcome::Accepted { focus, fatigue }
    }

    pub fn reset(&mut self) {
        self.focus_history.clear();
        self.fatigue_history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> FocusFatigueScorer {
        FocusFatigueScorer::new(ScoringStrategy::default(), NoiseGate::default(), 8)
    }

    #[test]
    fn test_linear_defaults() {
        let b = BandPowers::new(0.2, 0.2, 0.3, 0.2, 0.1);
        let (focus, fatigue) = ScoringStrategy::default().score(&b);
        // focus_raw = 0.23 + 0.075 - 0.18 = 0.125 -> 0.375 / 0.75
        assert!((focus - 0.5).abs() < 1e-5);
        // fatigue_raw = 0.22 + 0.06 - 0.12 = 0.16 -> 0.26 / 0.70
        assert!((fatigue - 0.26 / 0.70).abs() < 1e-5);
    }

    #[test]
    fn test_ratio_strategy() {
        let b = BandPowers::new(0.2, 0.2, 0.2, 0.3, 0.1);
        let (focus, fatigue) = ScoringStrategy::Ratio.score(&b);
        assert!((focus - 0.75).abs() < 1e-5);
        assert!((fatigue - 0.4).abs() < 1e-5);

        // all-zero alpha/theta does not explode
        let (focus, _) = ScoringStrategy::Ratio.score(&BandPowers::new(0.0, 0.0, 0.0, 1.0, 0.0));
        assert_eq!(focus, 1.0);
    }

    #[test]
    fn test_noise_rejected_and_history_cleared() {
        let mut s = scorer();
        let calm = BandPowers::new(0.2, 0.2, 0.3, 0.2, 0.1);
        let first = s.observe(&calm);
        assert!(matches!(first, ScoreOutcome::Accepted { .. }));

        let artifact = BandPowers::new(0.0, 0.1, 0.1, 0.8, 0.0);
        assert_eq!(s.observe(&artifact), ScoreOutcome::Noise);

        // next valid reading is not blended with pre-noise history
        let alert = BandPowers::new(0.1, 0.1, 0.3, 0.4, 0.1);
        let (focus, _) = ScoringStrategy::default().score(&alert);
        match s.observe(&alert) {
            ScoreOutcome::Accepted { focus: f, .. } => assert!((f - focus).abs() < 1e-6),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_dominant_beta_with_low_alpha_theta_rejected() {
        let gate = NoiseGate::default();
        assert!(gate.is_noise(&BandPowers::new(0.2, 0.05, 0.1, 0.6, 0.05)));
        assert!(!gate.is_noise(&BandPowers::new(0.1, 0.1, 0.15, 0.6, 0.05)));
    }

    #[test]
    fn test_trailing_mean_output() {
        let mut s = scorer();
        let low = BandPowers::new(0.3, 0.4, 0.2, 0.05, 0.05);
        let high = BandPowers::new(0.1, 0.1, 0.3, 0.45, 0.05);
        let (f_low, _) = s.strategy().score(&low);
        let (f_high, _) = s.strategy().score(&high);
        s.observe(&low);
        match s.observe(&high) {
            ScoreOutcome::Accepted { focus, .. } => {
                assert!((focus - (f_low + f_high) / 2.0).abs() < 1e-6)
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
