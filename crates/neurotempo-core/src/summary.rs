//! Per-session statistics and the end-of-session summary.

use serde::{Deserialize, Serialize};

use crate::metrics::MetricsSnapshot;

/// Running sums over accepted ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub samples: u32,
    pub focus_sum: f64,
    pub hr_sum: u64,
    pub hr_samples: u32,
    pub spo2_sum: u64,
    pub spo2_samples: u32,
}

impl SessionStats {
    pub fn record(&mut self, snapshot: &MetricsSnapshot) {
        self.samples += 1;
        self.focus_sum += snapshot.focus as f64;
        if let Some(hr) = snapshot.heart_rate {
            self.hr_sum += hr as u64;
            self.hr_samples += 1;
        }
        if let Some(spo2) = snapshot.spo2 {
            self.spo2_sum += spo2 as u64;
            self.spo2_samples += 1;
        }
    }

    pub fn summarize(&self, duration_s: f64, baseline: f32, breaks: u32) -> SessionSummary {
        let avg_focus = if self.samples > 0 {
            (self.focus_sum / self.samples as f64) as f32
        } else {
            baseline
        };
        let average = |sum: u64, n: u32| {
            if n > 0 {
                Some((sum as f64 / n as f64).round() as u32)
            } else {
                None
            }
        };
        SessionSummary {
            duration_s: duration_s.max(0.0) as u64,
            baseline,
            avg_focus: avg_focus.clamp(0.0, 1.0),
            breaks,
            avg_hr: average(self.hr_sum, self.hr_samples),
            avg_spo2: average(self.spo2_sum, self.spo2_samples),
        }
    }
}

/// Handed to the history collaborator at session end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub duration_s: u64,
    pub baseline: f32,
    pub avg_focus: f32,
    pub breaks: u32,
    pub avg_hr: Option<u32>,
    pub avg_spo2: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_averages_only_over_measured_ticks() {
        let mut stats = SessionStats::default();
        stats.record(&MetricsSnapshot {
            focus: 0.4,
            fatigue: 0.2,
            heart_rate: Some(70),
            spo2: None,
        });
        stats.record(&MetricsSnapshot {
            focus: 0.8,
            fatigue: 0.2,
            heart_rate: Some(75),
            spo2: None,
        });
        let s = stats.summarize(61.7, 0.6, 2);
        assert_eq!(s.duration_s, 61);
        assert!((s.avg_focus - 0.6).abs() < 1e-6);
        assert_eq!(s.avg_hr, Some(73));
        assert_eq!(s.avg_spo2, None);
        assert_eq!(s.breaks, 2);
    }

    #[test]
    fn test_empty_session_falls_back_to_baseline() {
        let s = SessionStats::default().summarize(5.0, 0.55, 0);
        assert_eq!(s.avg_focus, 0.55);
        assert_eq!(s.avg_hr, None);
    }

    #[test]
    fn test_summary_json_shape() {
        let s = SessionStats::default().summarize(90.0, 0.6, 1);
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["duration_s"], 90);
        assert_eq!(json["breaks"], 1);
        assert!(json["avg_hr"].is_null());
    }
}
