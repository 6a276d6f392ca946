use neurotempo_core::{
    BreakPolicyEngine, PolicyConfig, PolicyPhase, SessionStatus, BREAK_MESSAGE, BREAK_TITLE,
};

fn fire_times(engine: &mut BreakPolicyEngine, from: u32, to: u32, focus: f32, fatigue: f32) -> Vec<u32> {
    (from..to)
        .filter(|t| engine.observe(*t as f64, focus, fatigue).is_some())
        .collect()
}

#[test]
fn test_sustained_low_fires_once_per_cooldown() {
    let mut engine = BreakPolicyEngine::new(PolicyConfig::default(), 0.6, 0.0);
    let fired = fire_times(&mut engine, 0, 700, 0.2, 0.7);

    // grace ends at 120, 25 s streak, 480 s cooldown, then another 25 s
    assert_eq!(fired, vec![145, 650]);
    assert_eq!(engine.state().breaks, 2);
    assert_eq!(engine.state().last_break_at, Some(650.0));
}

#[test]
fn test_phases_follow_session_clock() {
    let mut engine = BreakPolicyEngine::new(PolicyConfig::default(), 0.6, 1000.0);
    assert_eq!(engine.phase(1000.0), PolicyPhase::Grace);
    assert_eq!(engine.phase(1119.0), PolicyPhase::Grace);
    assert_eq!(engine.phase(1120.0), PolicyPhase::ActiveMonitoring);

    let fired = fire_times(&mut engine, 1120, 1146, 0.1, 0.9);
    assert_eq!(fired, vec![1145]);
    assert_eq!(engine.phase(1146.0), PolicyPhase::Cooldown);
    assert_eq!(engine.phase(1624.9), PolicyPhase::Cooldown);
    assert_eq!(engine.phase(1625.0), PolicyPhase::ActiveMonitoring);
}

#[test]
fn test_event_carries_fixed_text() {
    let mut engine = BreakPolicyEngine::new(PolicyConfig::default(), 0.6, 0.0);
    let event = (120..200)
        .find_map(|t| engine.observe(t as f64, 0.0, 1.0))
        .unwrap();
    assert_eq!(event.title, BREAK_TITLE);
    assert_eq!(event.message, BREAK_MESSAGE);
    assert_eq!(event.break_index, 1);
    assert_eq!(event.at_s, 145.0);
}

#[test]
fn test_fatigue_exactly_at_gate_counts() {
    let mut engine = BreakPolicyEngine::new(PolicyConfig::default(), 0.6, 0.0);
    let fired = fire_times(&mut engine, 120, 200, 0.3, 0.45);
    assert_eq!(fired, vec![145]);
}

#[test]
fn test_focus_at_threshold_is_not_low() {
    // baseline 0.5 -> threshold 0.35
    let mut engine = BreakPolicyEngine::new(PolicyConfig::default(), 0.5, 0.0);
    let th = engine.low_threshold();
    assert!(fire_times(&mut engine, 120, 400, th, 0.9).is_empty());
}

#[test]
fn test_interruptions_restart_the_streak() {
    let mut engine = BreakPolicyEngine::new(PolicyConfig::default(), 0.6, 0.0);
    let mut fired = Vec::new();
    for t in 120..300u32 {
        // signal lost for one tick every 20 s
        if t % 20 == 0 {
            engine.interrupt();
            continue;
        }
        if engine.observe(t as f64, 0.1, 0.8).is_some() {
            fired.push(t);
        }
    }
    assert!(fired.is_empty());
}

#[test]
fn test_custom_timings() {
    let config = PolicyConfig {
        grace_period_s: 0,
        sustained_low_required_s: 5,
        cooldown_s: 60,
        ..PolicyConfig::default()
    };
    let mut engine = BreakPolicyEngine::new(config, 0.6, 0.0);
    assert_eq!(fire_times(&mut engine, 0, 140, 0.1, 0.8), vec![5, 70, 135]);
}

#[test]
fn test_status_classification_tracks_phase() {
    let gate = 0.45;
    assert_eq!(
        SessionStatus::classify(true, PolicyPhase::Grace, 0.1, 0.9, gate),
        SessionStatus::SettlingIn
    );
    assert_eq!(
        SessionStatus::classify(true, PolicyPhase::ActiveMonitoring, 0.7, 0.9, gate),
        SessionStatus::KeepWorking
    );
    assert_eq!(
        SessionStatus::classify(true, PolicyPhase::ActiveMonitoring, 0.5, 0.9, gate),
        SessionStatus::TakeABreath
    );
    assert_eq!(
        SessionStatus::classify(true, PolicyPhase::Cooldown, 0.2, 0.9, gate),
        SessionStatus::Recovering
    );
    assert_eq!(
        SessionStatus::classify(true, PolicyPhase::ActiveMonitoring, 0.2, 0.3, gate),
        SessionStatus::LowFocusNotFatigued
    );
    assert_eq!(
        SessionStatus::classify(false, PolicyPhase::ActiveMonitoring, 0.9, 0.0, gate),
        SessionStatus::NotWorn
    );
}
