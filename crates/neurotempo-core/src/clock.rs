//! Session clock with monotonic tick enforcement.
//!
//! Tick times come from the host (seconds on any monotonic base). A tick that
//! goes backwards is rejected so smoothing and policy state never see time
//! travel.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ClockError {
    #[error("tick time regression: now={now} < last={last} (delta={delta}s)")]
    Regression { now: f64, last: f64, delta: f64 },
    #[error("tick time is not finite: {0}")]
    NotFinite(f64),
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SessionClock {
    /// Last accepted tick time
    pub last_tick: Option<f64>,
    /// Session start time
    pub session_start: Option<f64>,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a tick time, verifying monotonicity.
    ///
    /// # Returns
    /// * `Ok(dt_sec)` - seconds since the previous tick (0.0 if first)
    /// * `Err(ClockError)` - if the time went backwards or is not finite
    pub fn advance(&mut self, now: f64) -> Result<f64, ClockError> {
        if !now.is_finite() {
            return Err(ClockError::NotFinite(now));
        }
        let dt = match self.last_tick {
            Some(last) if now < last => {
                return Err(ClockError::Regression {
                    now,
                    last,
                    delta: now - last,
                })
            }
            Some(last) => now - last,
            None => 0.0,
        };
        self.last_tick = Some(now);
        Ok(dt)
    }

    /// Start a new session if not running. Returns true if one was started.
    pub fn start_session(&mut self, now: f64) -> bool {
        if self.session_start.is_none() {
            self.session_start = Some(now);
            true
        } else {
            false
        }
    }

    /// Current session duration in seconds.
    pub fn session_duration(&self, now: f64) -> f64 {
        match self.session_start {
            Some(start) => (now - start).max(0.0),
            None => 0.0,
        }
    }

    pub fn end_session(&mut self) {
        self.session_start = None;
        self.last_tick = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonicity_check() {
        let mut clock = SessionClock::new();
        assert_eq!(clock.advance(10.0), Ok(0.0));
        assert_eq!(clock.advance(11.0), Ok(1.0));
        // same time is fine
        assert_eq!(clock.advance(11.0), Ok(0.0));
        assert!(matches!(
            clock.advance(10.5),
            Err(ClockError::Regression { .. })
        ));
        assert_eq!(clock.last_tick, Some(11.0));
        assert!(clock.advance(f64::NAN).is_err());
    }

    #[test]
    fn test_session_duration() {
        let mut clock = SessionClock::new();
        assert!(clock.start_session(100.0));
        assert!(!clock.start_session(150.0));
        assert_eq!(clock.session_duration(130.5), 30.5);
        clock.end_session();
        assert_eq!(clock.session_duration(200.0), 0.0);
    }
}
