#[cfg(test)]
mod tests {
    use crate::config::*;
    use crate::scoring::ScoringStrategy;
    use crate::worn::WornRule;
    use neurotempo_signals::Electrode;
    use std::env;
    use std::fs;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_default_config_valid() {
        let config = NeurotempoConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.hold_ticks(), 6);
    }

    #[test]
    fn test_config_validation_policy() {
        let mut config = NeurotempoConfig::default();

        config.policy.cooldown_s = 30;
        assert!(config.validate().is_err());

        config.policy.cooldown_s = 480;
        config.policy.threshold_min = 0.55;
        config.policy.threshold_max = 0.30;
        assert!(config.validate().is_err());

        config.policy.threshold_min = 0.25;
        config.policy.threshold_max = 0.60;
        config.policy.sustained_low_required_s = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_smoothing() {
        let mut config = NeurotempoConfig::default();
        config.smoothing.ema_alpha = 0.5;
        assert!(config.validate().is_err());

        config.smoothing.ema_alpha = 0.18;
        config.smoothing.history_len = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_contact() {
        let mut config = NeurotempoConfig::default();
        config.contact.quality.std_low = 90.0;
        assert!(config.validate().is_err());

        let mut config = NeurotempoConfig::default();
        config.contact.raw_order = vec![Electrode::TP9, Electrode::TP9, Electrode::AF8, Electrode::TP10];
        assert!(config.validate().is_err());

        let mut config = NeurotempoConfig::default();
        config.contact.raw_order.pop();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_acquisition() {
        let mut config = NeurotempoConfig::default();
        config.acquisition.welch_segment_s = 4.0;
        assert!(config.validate().is_err());

        let mut config = NeurotempoConfig::default();
        config.acquisition.tick_s = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_hold_ticks_rounds_up() {
        let mut config = NeurotempoConfig::default();
        config.worn.hold_s = 2.5;
        assert_eq!(config.hold_ticks(), 3);
        config.worn.hold_s = 0.0;
        assert_eq!(config.hold_ticks(), 0);
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let mut config = NeurotempoConfig::default();
        config.scoring.strategy = ScoringStrategy::Ratio;
        config.worn.rule = WornRule::Majority;
        config.contact.raw_order = vec![Electrode::AF7, Electrode::TP9, Electrode::TP10, Electrode::AF8];

        let file = NamedTempFile::new().unwrap();
        config.save_to_file(file.path()).unwrap();
        let loaded = NeurotempoConfig::from_file(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = NamedTempFile::new().unwrap();
        fs::write(
            file.path(),
            r#"
[policy]
cooldown_s = 900

[contact]
std_high = 120.0
"#,
        )
        .unwrap();

        let config = NeurotempoConfig::from_file(file.path()).unwrap();
        assert_eq!(config.policy.cooldown_s, 900);
        assert_eq!(config.policy.grace_period_s, 120);
        assert_eq!(config.contact.quality.std_high, 120.0);
        assert_eq!(config.contact.quality.std_low, 0.5);
        assert_eq!(config.contact.raw_order, Electrode::CANONICAL.to_vec());
    }

    #[test]
    fn test_invalid_file_rejected() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), "[policy]\ncooldown_s = 5\n").unwrap();
        assert!(matches!(
            NeurotempoConfig::from_file(file.path()),
            Err(ConfigError::Validation(_))
        ));

        fs::write(file.path(), "[policy\ncooldown_s = ").unwrap();
        assert!(matches!(
            NeurotempoConfig::from_file(file.path()),
            Err(ConfigError::TomlParse(_))
        ));
    }

    // Env-var cases share process state, so they run in one test.
    #[test]
    fn test_layering_and_env_overrides() {
        let dir = TempDir::new().unwrap();
        let defaults = dir.path().join("default.toml");
        let user = dir.path().join("user.toml");
        fs::write(
            &defaults,
            "[policy]\ngrace_period_s = 60\nthreshold_min = 0.30\n\n[worn]\nhold_s = 4.0\n",
        )
        .unwrap();
        fs::write(&user, "[policy]\ngrace_period_s = 90\n").unwrap();

        let config = NeurotempoConfig::load_layered(Some(&defaults), Some(&user)).unwrap();
        assert_eq!(config.policy.grace_period_s, 90);
        assert_eq!(config.policy.threshold_min, 0.30);
        assert_eq!(config.hold_ticks(), 4);

        let missing = dir.path().join("absent.toml");
        let config = NeurotempoConfig::load_layered(Some(&missing), None).unwrap();
        assert_eq!(config.policy.grace_period_s, 120);

        env::set_var("NEUROTEMPO_POLICY_COOLDOWN_S", "600");
        env::set_var("NEUROTEMPO_WORN_HOLD_S", "3");
        let config = NeurotempoConfig::load_layered(Some(&defaults), None).unwrap();
        assert_eq!(config.policy.cooldown_s, 600);
        assert_eq!(config.hold_ticks(), 3);

        env::set_var("NEUROTEMPO_POLICY_COOLDOWN_S", "ten minutes");
        let mut config = NeurotempoConfig::default();
        assert!(config.apply_env_overrides().is_err());

        env::remove_var("NEUROTEMPO_POLICY_COOLDOWN_S");
        env::remove_var("NEUROTEMPO_WORN_HOLD_S");
        let mut config = NeurotempoConfig::default();
        config.apply_env_overrides().unwrap();
        assert_eq!(config, NeurotempoConfig::default());
    }
}
