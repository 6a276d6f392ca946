use proptest::prelude::*;

/// Property-based checks for scoring, smoothing and policy bounds.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PolicyConfig;
    use crate::policy::BreakPolicyEngine;
    use crate::scoring::{NoiseGate, ScoringStrategy};
    use crate::smoothing::{Ema, TrailingMean};
    use neurotempo_signals::BandPowers;

    fn normalized(d: f32, t: f32, a: f32, b: f32, g: f32) -> Option<BandPowers> {
        BandPowers::new(d, t, a, b, g).normalized()
    }

    // =========================================================================
    // Scores are bounded for any band-power mix
    // =========================================================================
    proptest! {
        #[test]
        fn test_scores_bounded(
            d in 0.0f32..100.0,
            t in 0.0f32..100.0,
            a in 0.0f32..100.0,
            b in 0.0f32..100.0,
            g in 0.0f32..100.0,
        ) {
            if let Some(bands) = normalized(d, t, a, b, g) {
                for strategy in [ScoringStrategy::default(), ScoringStrategy::Ratio] {
                    let (focus, fatigue) = strategy.score(&bands);
                    prop_assert!((0.0..=1.0).contains(&focus), "focus {}", focus);
                    prop_assert!((0.0..=1.0).contains(&fatigue), "fatigue {}", fatigue);
                }
            }
        }
    }

    #[test]
    fn test_scores_bounded_at_extremes() {
        let pure_beta = BandPowers::new(0.0, 0.0, 0.0, 1.0, 0.0);
        let pure_theta = BandPowers::new(0.0, 1.0, 0.0, 0.0, 0.0);
        for strategy in [ScoringStrategy::default(), ScoringStrategy::Ratio] {
            for bands in [pure_beta, pure_theta] {
                let (f, z) = strategy.score(&bands);
                assert!((0.0..=1.0).contains(&f));
                assert!((0.0..=1.0).contains(&z));
            }
        }
    }

    // =========================================================================
    // Beta above the hard cap is always noise
    // =========================================================================
    proptest! {
        #[test]
        fn test_noise_gate_rejects_beta_dominance(beta in 0.76f32..1.0, rest in 0.0f32..0.24) {
            let bands = BandPowers::new(rest / 4.0, rest / 4.0, rest / 4.0, beta, rest / 4.0);
            prop_assert!(NoiseGate::default().is_noise(&bands));
        }

        #[test]
        fn test_noise_gate_passes_balanced(theta in 0.15f32..0.4, alpha in 0.15f32..0.4) {
            let beta = 0.3;
            let bands = BandPowers::new(0.1, theta, alpha, beta, 0.05);
            prop_assert!(!NoiseGate::default().is_noise(&bands));
        }
    }

    // =========================================================================
    // Smoothers stay within the range of their inputs
    // =========================================================================
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_trailing_mean_within_input_range(
            values in prop::collection::vec(0.0f32..1.0, 1..40),
            cap in 1usize..12,
        ) {
            let mut mean = TrailingMean::new(cap);
            for v in &values {
                mean.push(*v);
            }
            let window = &values[values.len().saturating_sub(cap)..];
            let lo = window.iter().cloned().fold(f32::INFINITY, f32::min);
            let hi = window.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
            let m = mean.mean().unwrap();
            prop_assert!(m >= lo - 1e-5 && m <= hi + 1e-5);
            prop_assert!(mean.len() <= cap);
        }

        #[test]
        fn test_ema_stays_in_unit_interval(
            seed in 0.0f32..1.0,
            values in prop::collection::vec(0.0f32..1.0, 1..60),
            alpha in 0.05f32..0.35,
        ) {
            let mut ema = Ema::seeded(alpha, seed);
            for v in values {
                let out = ema.update(v);
                prop_assert!((0.0..=1.0).contains(&out));
            }
        }
    }

    // =========================================================================
    // Low threshold respects its clamp for any baseline
    // =========================================================================
    proptest! {
        #[test]
        fn test_low_threshold_clamped(baseline in 0.0f32..1.0) {
            let config = PolicyConfig::default();
            let engine = BreakPolicyEngine::new(config.clone(), baseline, 0.0);
            let th = engine.low_threshold();
            prop_assert!(th >= config.threshold_min && th <= config.threshold_max);
        }

        #[test]
        fn test_no_break_inside_grace(
            focus in 0.0f32..0.2,
            fatigue in 0.5f32..1.0,
        ) {
            let mut engine = BreakPolicyEngine::new(PolicyConfig::default(), 0.6, 0.0);
            for t in 0..120 {
                prop_assert!(engine.observe(t as f64, focus, fatigue).is_none());
            }
        }
    }
}
