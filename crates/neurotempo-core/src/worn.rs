//! Worn / not-worn tracking with debounce, warm-up and grace-hold.
//!
//! # Usage
//!
//! ```ignore
//! let mut tracker = WornTracker::new(WornTrackerConfig::default());
//!
//! let status = tracker.observe(tracker.instant_worn(&report));
//! if !status.is_worn() {
//!     match tracker.miss() {
//!         HoldOutcome::Replay(snapshot) => show(snapshot),
//!         _ => show(MetricsSnapshot::zero()),
//!     }
//! } else if status.warming_up {
//!     show(MetricsSnapshot::zero());
//! } else {
//!     tracker.accept(snapshot);
//! }
//! ```

use serde::{Deserialize, Serialize};

use neurotempo_signals::ContactReport;

use crate::metrics::MetricsSnapshot;

/// How per-electrode results combine into one instant "worn" reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WornRule {
    /// At least one electrode green
    AnyChannel,
    /// More than half the electrodes green
    Majority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WornState {
    NotWorn,
    Worn,
}

/// Tracker configuration, in ticks
#[derive(Debug, Clone, PartialEq)]
pub struct WornTrackerConfig {
    pub rule: WornRule,
    /// Consecutive same-direction readings needed to flip
    pub debounce_ticks: u32,
    /// Ticks suppressed after a flip, the flip tick included
    pub warmup_ticks: u32,
    /// Missed ticks after which replay stops
    pub hold_ticks: u32,
}

impl Default for WornTrackerConfig {
    fn default() -> Self {
        Self {
            rule: WornRule::AnyChannel,
            debounce_ticks: 3,
            warmup_ticks: 4,
            hold_ticks: 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WornStatus {
    pub state: WornState,
    /// State changed on this tick
    pub flipped: bool,
    /// Scores must be suppressed on this tick
    pub warming_up: bool,
}

impl WornStatus {
    pub fn is_worn(&self) -> bool {
        self.state == WornState::Worn
    }
}

/// What to show on a tick without a fresh accepted snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HoldOutcome {
    /// Replay the last good snapshot
    Replay(MetricsSnapshot),
    /// The hold ran out on this tick
    Expired,
    /// Nothing to replay
    Unavailable,
}

impl HoldOutcome {
    pub fn snapshot(&self) -> MetricsSnapshot {
        match self {
            HoldOutcome::Replay(snapshot) => *snapshot,
            HoldOutcome::Expired | HoldOutcome::Unavailable => MetricsSnapshot::zero(),
        }
    }
}

pub struct WornTracker {
    config: WornTrackerConfig,
    state: WornState,
    /// Consecutive readings disagreeing with `state`
    opposing_hits: u32,
    warmup_remaining: u32,
    missed: u32,
    last_good: Option<MetricsSnapshot>,
}

impl WornTracker {
    pub fn new(config: WornTrackerConfig) -> Self {
        Self {
            config,
            state: WornState::NotWorn,
            opposing_hits: 0,
            warmup_remaining: 0,
            missed: 0,
            last_good: None,
        }
    }

    /// Instant validity of one contact report under the configured rule.
    pub fn instant_worn(&self, report: &ContactReport) -> bool {
        let passing = report.passing_count();
        match self.config.rule {
            WornRule::AnyChannel => passing >= 1,
            WornRule::Majority => passing * 2 > report.channels.len(),
        }
    }

    /// Feed one instant reading through the debounce.
    pub fn observe(&mut self, instant_worn: bool) -> WornStatus {
        let reading = if instant_worn {
            WornState::Worn
        } else {
            WornState::NotWorn
        };

        let mut flipped = false;
        if reading == self.state {
            self.opposing_hits = 0;
        } else {
            self.opposing_hits += 1;
            if self.opposing_hits >= self.config.debounce_ticks.max(1) {
                log::info!("worn state {:?} -> {:?}", self.state, reading);
                self.state = reading;
                self.opposing_hits = 0;
                self.warmup_remaining = self.config.warmup_ticks;
                flipped = true;
            }
        }

        let warming_up = if self.warmup_remaining > 0 {
            self.warmup_remaining -= 1;
            if self.warmup_remaining == 0 {
                log::debug!("warm-up finished");
            }
            true
        } else {
            false
        };

        WornStatus {
            state: self.state,
            flipped,
            warming_up,
        }
    }

    /// Record a validated snapshot; resets the hold.
    pub fn accept(&mut self, snapshot: MetricsSnapshot) {
        self.missed = 0;
        self.last_good = Some(snapshot);
    }

    /// A tick without a fresh snapshot (not worn, not ready, or noise).
    pub fn miss(&mut self) -> HoldOutcome {
        self.missed = self.missed.saturating_add(1);
        match self.last_good {
            Some(snapshot) if self.missed < self.config.hold_ticks => HoldOutcome::Replay(snapshot),
            Some(_) => {
                log::info!("grace-hold expired after {} missed ticks", self.missed);
                self.last_good = None;
                HoldOutcome::Expired
            }
            None => HoldOutcome::Unavailable,
        }
    }

    pub fn state(&self) -> WornState {
        self.state
    }

    pub fn is_worn(&self) -> bool {
        self.state == WornState::Worn
    }

    pub fn last_good(&self) -> Option<MetricsSnapshot> {
        self.last_good
    }

    pub fn config(&self) -> &WornTrackerConfig {
        &self.config
    }

    /// Reset to initial state
    pub fn reset(&mut self) {
        self.state = WornState::NotWorn;
        self.opposing_hits = 0;
        self.warmup_remaining = 0;
        self.missed = 0;
        self.last_good = None;
    }
}
