use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use neurotempo_signals::{ContactQualityConfig, Electrode, VitalsConfig};

use crate::scoring::{NoiseGate, ScoringStrategy};
use crate::worn::WornRule;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeurotempoConfig {
    pub smoothing: SmoothingConfig,
    pub scoring: ScoringConfig,
    pub policy: PolicyConfig,
    pub contact: ContactConfig,
    pub worn: WornConfig,
    pub vitals: VitalsConfig,
    pub acquisition: AcquisitionConfig,
    pub calibration: CalibrationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// EMA decay for the break-policy view of focus/fatigue
    pub ema_alpha: f32,
    /// Trailing-mean capacity for scorer output (ticks)
    pub history_len: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub strategy: ScoringStrategy,
    pub noise_gate: NoiseGate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub grace_period_s: u32,
    pub sustained_low_required_s: u32,
    pub cooldown_s: u32,
    pub fatigue_gate: f32,
    pub threshold_multiplier: f32,
    pub threshold_min: f32,
    pub threshold_max: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactConfig {
    #[serde(flatten)]
    pub quality: ContactQualityConfig,
    /// Electrode carried by each raw EEG row, in row order
    pub raw_order: Vec<Electrode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WornConfig {
    pub rule: WornRule,
    /// Consecutive same-direction readings needed to flip state
    pub debounce_ticks: u32,
    /// Ticks of suppressed scores after a flip
    pub warmup_ticks: u32,
    /// Seconds the last good snapshot may be replayed
    pub hold_s: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// EEG analysis window (s)
    pub window_s: f32,
    /// Host tick period (s)
    pub tick_s: f32,
    /// PPG window for vitals (s)
    pub vitals_window_s: f32,
    pub welch_segment_s: f32,
    pub welch_overlap: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Accepted focus samples collected for the baseline
    pub duration_s: u32,
    /// Baseline used when calibration is skipped
    pub default_baseline: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            ema_alpha: 0.18,
            history_len: 8,
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            grace_period_s: 120,
            sustained_low_required_s: 25,
            cooldown_s: 480,
            fatigue_gate: 0.45,
            threshold_multiplier: 0.70,
            threshold_min: 0.25,
            threshold_max: 0.60,
        }
    }
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            quality: ContactQualityConfig::default(),
            raw_order: Electrode::CANONICAL.to_vec(),
        }
    }
}

impl Default for WornConfig {
    fn default() -> Self {
        Self {
            rule: WornRule::AnyChannel,
            debounce_ticks: 3,
            warmup_ticks: 4,
            hold_s: 6.0,
        }
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            window_s: 2.0,
            tick_s: 1.0,
            vitals_window_s: 8.0,
            welch_segment_s: 1.0,
            welch_overlap: 0.5,
        }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            duration_s: 30,
            default_baseline: 0.60,
        }
    }
}

impl NeurotempoConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: NeurotempoConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    /// Environment variables are prefixed with NEUROTEMPO_
    /// Example: NEUROTEMPO_POLICY_COOLDOWN_S=600
    pub fn from_file_with_env<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. User config file (if exists), merged key by key
    /// 3. Default config file
    /// 4. Built-in defaults (lowest priority)
    pub fn load_layered(
        default_path: Option<&Path>,
        user_path: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let mut layered = toml::Value::Table(toml::map::Map::new());

        for path in [default_path, user_path].into_iter().flatten() {
            if path.exists() {
                let content = fs::read_to_string(path)?;
                let layer: toml::Value = toml::from_str(&content)?;
                merge_values(&mut layered, layer);
            }
        }

        let mut config: NeurotempoConfig = layered.try_into()?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    pub(crate) fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        // Smoothing overrides
        env_override("NEUROTEMPO_SMOOTHING_EMA_ALPHA", &mut self.smoothing.ema_alpha)?;
        env_override("NEUROTEMPO_SMOOTHING_HISTORY_LEN", &mut self.smoothing.history_len)?;

        // Policy overrides
        env_override("NEUROTEMPO_POLICY_GRACE_PERIOD_S", &mut self.policy.grace_period_s)?;
        env_override(
            "NEUROTEMPO_POLICY_SUSTAINED_LOW_REQUIRED_S",
            &mut self.policy.sustained_low_required_s,
        )?;
        env_override("NEUROTEMPO_POLICY_COOLDOWN_S", &mut self.policy.cooldown_s)?;
        env_override("NEUROTEMPO_POLICY_FATIGUE_GATE", &mut self.policy.fatigue_gate)?;
        env_override(
            "NEUROTEMPO_POLICY_THRESHOLD_MULTIPLIER",
            &mut self.policy.threshold_multiplier,
        )?;
        env_override("NEUROTEMPO_POLICY_THRESHOLD_MIN", &mut self.policy.threshold_min)?;
        env_override("NEUROTEMPO_POLICY_THRESHOLD_MAX", &mut self.policy.threshold_max)?;

        // Contact overrides
        env_override("NEUROTEMPO_CONTACT_STD_LOW", &mut self.contact.quality.std_low)?;
        env_override("NEUROTEMPO_CONTACT_STD_HIGH", &mut self.contact.quality.std_high)?;

        // Worn-state overrides
        env_override("NEUROTEMPO_WORN_DEBOUNCE_TICKS", &mut self.worn.debounce_ticks)?;
        env_override("NEUROTEMPO_WORN_WARMUP_TICKS", &mut self.worn.warmup_ticks)?;
        env_override("NEUROTEMPO_WORN_HOLD_S", &mut self.worn.hold_s)?;

        // Acquisition overrides
        env_override("NEUROTEMPO_ACQUISITION_WINDOW_S", &mut self.acquisition.window_s)?;
        env_override("NEUROTEMPO_ACQUISITION_TICK_S", &mut self.acquisition.tick_s)?;

        // Calibration overrides
        env_override("NEUROTEMPO_CALIBRATION_DURATION_S", &mut self.calibration.duration_s)?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Smoothing validation
        let alpha = self.smoothing.ema_alpha;
        if !(0.05..=0.35).contains(&alpha) {
            return Err(invalid("smoothing.ema_alpha must be in [0.05, 0.35]"));
        }
        if self.smoothing.history_len == 0 {
            return Err(invalid("smoothing.history_len must be > 0"));
        }

        // Policy validation
        let p = &self.policy;
        if p.grace_period_s > 600 {
            return Err(invalid("policy.grace_period_s must be in [0, 600]"));
        }
        if !(5..=120).contains(&p.sustained_low_required_s) {
            return Err(invalid("policy.sustained_low_required_s must be in [5, 120]"));
        }
        if !(60..=3600).contains(&p.cooldown_s) {
            return Err(invalid("policy.cooldown_s must be in [60, 3600]"));
        }
        if !(0.0..=1.0).contains(&p.fatigue_gate) {
            return Err(invalid("policy.fatigue_gate must be in [0, 1]"));
        }
        if !(0.50..=0.90).contains(&p.threshold_multiplier) {
            return Err(invalid("policy.threshold_multiplier must be in [0.50, 0.90]"));
        }
        if !(0.10..=0.60).contains(&p.threshold_min) {
            return Err(invalid("policy.threshold_min must be in [0.10, 0.60]"));
        }
        if !(0.20..=0.90).contains(&p.threshold_max) {
            return Err(invalid("policy.threshold_max must be in [0.20, 0.90]"));
        }
        if p.threshold_min > p.threshold_max {
            return Err(invalid("policy.threshold_min must be <= threshold_max"));
        }

        // Contact validation
        let c = &self.contact.quality;
        if c.std_low < 0.0 || c.std_low >= c.std_high {
            return Err(invalid("contact.std_low must be in [0, std_high)"));
        }
        if c.ptp_low < 0.0 || c.ptp_low >= c.ptp_high {
            return Err(invalid("contact.ptp_low must be in [0, ptp_high)"));
        }
        if c.extreme_std <= c.std_high {
            return Err(invalid("contact.extreme_std must be > std_high"));
        }
        if c.good_std >= c.bad_std {
            return Err(invalid("contact.good_std must be < bad_std"));
        }
        if c.line_band_hz.0 >= c.line_band_hz.1 || c.reference_band_hz.0 >= c.reference_band_hz.1 {
            return Err(invalid("contact bands must have low < high"));
        }
        if !(0.0..=1.0).contains(&c.max_repeat_ratio) {
            return Err(invalid("contact.max_repeat_ratio must be in [0, 1]"));
        }
        if c.max_line_noise_ratio < 0.0 {
            return Err(invalid("contact.max_line_noise_ratio must be non-negative"));
        }
        if c.extreme_quorum == 0 || c.extreme_quorum > Electrode::CANONICAL.len() {
            return Err(invalid("contact.extreme_quorum must be in [1, 4]"));
        }
        if let Err(e) = neurotempo_signals::ElectrodeMap::from_raw_order(&self.contact.raw_order) {
            return Err(ConfigError::Validation(format!("contact.raw_order: {}", e)));
        }

        // Worn-state validation
        if self.worn.debounce_ticks == 0 {
            return Err(invalid("worn.debounce_ticks must be >= 1"));
        }
        if self.worn.hold_s < 0.0 {
            return Err(invalid("worn.hold_s must be non-negative"));
        }

        // Vitals validation
        let v = &self.vitals;
        let (lo, hi) = v.hr_band_hz;
        if lo <= 0.0 || lo >= hi {
            return Err(invalid("vitals.hr_band_hz must satisfy 0 < low < high"));
        }
        if lo * 60.0 < v.min_bpm || hi * 60.0 > v.max_bpm {
            return Err(invalid("vitals.hr_band_hz must lie inside [min_bpm, max_bpm]"));
        }
        if v.spo2_min < 0.0 || v.spo2_max > 100.0 || v.spo2_min >= v.spo2_max {
            return Err(invalid("vitals spo2 range must lie inside [0, 100]"));
        }

        // Acquisition validation
        let a = &self.acquisition;
        if a.tick_s <= 0.0 {
            return Err(invalid("acquisition.tick_s must be positive"));
        }
        if a.window_s <= 0.0 || a.vitals_window_s <= 0.0 {
            return Err(invalid("acquisition windows must be positive"));
        }
        if a.welch_segment_s <= 0.0 || a.welch_segment_s > a.window_s {
            return Err(invalid("acquisition.welch_segment_s must be in (0, window_s]"));
        }
        if !(0.0..0.95).contains(&a.welch_overlap) {
            return Err(invalid("acquisition.welch_overlap must be in [0, 0.95)"));
        }

        // Calibration validation
        if self.calibration.duration_s == 0 {
            return Err(invalid("calibration.duration_s must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.calibration.default_baseline) {
            return Err(invalid("calibration.default_baseline must be in [0, 1]"));
        }

        Ok(())
    }

    /// Grace-hold length in ticks: `ceil(hold_s / tick_s)`.
    pub fn hold_ticks(&self) -> u32 {
        (self.worn.hold_s / self.acquisition.tick_s).ceil().max(0.0) as u32
    }

    /// Export configuration to TOML string
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = self
            .to_toml_string()
            .map_err(|e| ConfigError::Validation(format!("TOML serialization error: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }
}

fn invalid(msg: &str) -> ConfigError {
    ConfigError::Validation(msg.to_string())
}

fn env_override<T: FromStr>(key: &str, target: &mut T) -> Result<(), ConfigError> {
    match env::var(key) {
        Ok(val) => {
            *target = val
                .trim()
                .parse()
                .map_err(|_| ConfigError::Validation(format!("Invalid {}", key)))?;
            Ok(())
        }
        Err(env::VarError::NotPresent) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Deep-merge `overlay` into `base`; tables merge per key, anything else is replaced.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
