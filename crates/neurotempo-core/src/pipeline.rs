//! One-tick wiring of the session pipeline.
//!
//! Each `tick` pulls a window from the source, scores contact quality, runs
//! it through the worn-state debounce, and if the headset is worn and settled
//! extracts band powers, scores focus/fatigue, estimates vitals and feeds the
//! break policy. Ticks without a fresh accepted snapshot go through the
//! grace-hold. A tick never fails; the outcome says what happened.

use serde::{Deserialize, Serialize};

use neurotempo_signals::{
    BandPowerConfig, BandPowerExtractor, BandPowers, ContactQualityEstimator, ContactReport,
    ElectrodeMap, NotReadyReason, Vitals, VitalsEstimator, Window,
};

use crate::clock::SessionClock;
use crate::config::NeurotempoConfig;
use crate::error::PipelineError;
use crate::metrics::MetricsSnapshot;
use crate::notify::{BreakNotifier, LogNotifier};
use crate::policy::{BreakEvent, BreakPolicyEngine, BreakPolicyState, PolicyPhase};
use crate::scoring::{FocusFatigueScorer, ScoreOutcome};
use crate::smoothing::Ema;
use crate::source::SignalSource;
use crate::status::SessionStatus;
use crate::summary::{SessionStats, SessionSummary};
use crate::worn::{HoldOutcome, WornState, WornTracker, WornTrackerConfig};

/// Initial fatigue EMA value for a new session.
const FATIGUE_SEED: f32 = 0.25;

/// Why a tick produced no fresh snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissReason {
    NotReady(NotReadyReason),
    NotWorn,
    Noise,
    NoBandPower,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickOutcome {
    /// Fresh validated snapshot
    Accepted,
    /// Worn, but scores suppressed while the signal settles
    WarmingUp,
    /// No fresh snapshot; `replayed` tells whether the last good one was shown
    Missed { reason: MissReason, replayed: bool },
    /// Tick time went backwards; previous report returned unchanged
    Rejected,
}

/// Everything the presentation side needs after one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    pub at_s: f64,
    pub metrics: MetricsSnapshot,
    pub outcome: TickOutcome,
    pub worn: WornState,
    pub status: SessionStatus,
    /// Policy view of focus/fatigue
    pub focus_ema: Option<f32>,
    pub fatigue_ema: Option<f32>,
    pub bands: Option<BandPowers>,
    pub break_event: Option<BreakEvent>,
}

impl TickReport {
    fn initial() -> Self {
        Self {
            at_s: 0.0,
            metrics: MetricsSnapshot::zero(),
            outcome: TickOutcome::Missed {
                reason: MissReason::NotWorn,
                replayed: false,
            },
            worn: WornState::NotWorn,
            status: SessionStatus::NotWorn,
            focus_ema: None,
            fatigue_ema: None,
            bands: None,
            break_event: None,
        }
    }
}

pub struct Pipeline {
    config: NeurotempoConfig,
    map: ElectrodeMap,
    baseline_focus: f32,
    quality: ContactQualityEstimator,
    bands: BandPowerExtractor,
    scorer: FocusFatigueScorer,
    vitals: VitalsEstimator,
    worn: WornTracker,
    policy: BreakPolicyEngine,
    focus_ema: Ema,
    fatigue_ema: Ema,
    clock: SessionClock,
    stats: SessionStats,
    notifier: Box<dyn BreakNotifier>,
    last_quality: Option<ContactReport>,
    last_report: TickReport,
}

impl Pipeline {
    /// Build a pipeline for one session.
    ///
    /// # Arguments
    /// * `config` - validated here; consumed at construction only
    /// * `baseline_focus` - calibrated baseline in [0, 1]
    pub fn new(config: NeurotempoConfig, baseline_focus: f32) -> Result<Self, PipelineError> {
        config.validate()?;
        if !(0.0..=1.0).contains(&baseline_focus) {
            return Err(PipelineError::Baseline(baseline_focus));
        }
        let map = ElectrodeMap::from_raw_order(&config.contact.raw_order)?;

        let worn_config = WornTrackerConfig {
            rule: config.worn.rule,
            debounce_ticks: config.worn.debounce_ticks,
            warmup_ticks: config.worn.warmup_ticks,
            hold_ticks: config.hold_ticks(),
        };
        let bands = BandPowerExtractor::with_config(BandPowerConfig {
            segment_s: config.acquisition.welch_segment_s,
            overlap: config.acquisition.welch_overlap,
        });
        let alpha = config.smoothing.ema_alpha;

        log::debug!(
            "pipeline: baseline={:.2} hold={} ticks window={}s",
            baseline_focus,
            worn_config.hold_ticks,
            config.acquisition.window_s
        );

        Ok(Self {
            map: map.clone(),
            baseline_focus,
            quality: ContactQualityEstimator::with_config(config.contact.quality.clone(), map),
            bands,
            scorer: FocusFatigueScorer::new(
                config.scoring.strategy,
                config.scoring.noise_gate,
                config.smoothing.history_len,
            ),
            vitals: VitalsEstimator::with_config(config.vitals.clone()),
            worn: WornTracker::new(worn_config),
            policy: BreakPolicyEngine::new(config.policy.clone(), baseline_focus, 0.0),
            focus_ema: Ema::seeded(alpha, baseline_focus),
            fatigue_ema: Ema::seeded(alpha, FATIGUE_SEED),
            clock: SessionClock::new(),
            stats: SessionStats::default(),
            notifier: Box::new(LogNotifier),
            last_quality: None,
            last_report: TickReport::initial(),
            config,
        })
    }

    /// Replace the break notifier (default: `LogNotifier`).
    pub fn with_notifier<N: BreakNotifier + 'static>(mut self, notifier: N) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    /// Advance the pipeline by one host tick at session-clock time `now`.
    pub fn tick<S: SignalSource + ?Sized>(&mut self, source: &mut S, now: f64) -> TickReport {
        if let Err(e) = self.clock.advance(now) {
            log::warn!("ignoring tick: {}", e);
            let mut report = self.last_report.clone();
            report.outcome = TickOutcome::Rejected;
            report.break_event = None;
            return report;
        }
        if self.clock.start_session(now) {
            log::info!("session started at {:.1}s", now);
            self.policy.reset(now);
        }

        let report = self.step(source, now);
        self.last_report = report.clone();
        report
    }

    fn step<S: SignalSource + ?Sized>(&mut self, source: &mut S, now: f64) -> TickReport {
        let frame = match source.get_window(self.config.acquisition.window_s) {
            Window::Ready(frame) => frame,
            Window::NotReady(reason) => {
                log::trace!("window not ready: {:?}", reason);
                return self.missed(now, MissReason::NotReady(reason));
            }
        };

        let fs = frame.sampling_rate();
        let eeg = frame.eeg();
        let quality = self.quality.estimate(eeg.view(), fs);
        let instant_worn = self.worn.instant_worn(&quality);
        let worn = self.worn.observe(instant_worn);
        let rows: Vec<usize> = quality
            .channels
            .iter()
            .filter(|c| c.passes())
            .map(|c| self.map.raw_row(c.electrode))
            .collect();
        self.last_quality = Some(quality);

        if worn.flipped {
            self.scorer.reset();
            self.vitals.reset();
        }
        if !worn.is_worn() {
            return self.missed(now, MissReason::NotWorn);
        }
        if worn.warming_up {
            return self.report(now, MetricsSnapshot::zero(), TickOutcome::WarmingUp, None, None);
        }
        // still debouncing towards NotWorn: this window is not valid signal
        if !instant_worn || rows.is_empty() {
            return self.missed(now, MissReason::NotWorn);
        }

        let bands = match self.bands.extract(eeg.view(), &rows, fs) {
            Some(bands) => bands,
            None => return self.missed(now, MissReason::NoBandPower),
        };
        let (focus, fatigue) = match self.scorer.observe(&bands) {
            ScoreOutcome::Accepted { focus, fatigue } => (focus, fatigue),
            ScoreOutcome::Noise => {
                let mut report = self.missed(now, MissReason::Noise);
                report.bands = Some(bands);
                return report;
            }
        };

        let vitals = if frame.layout().has_ppg() {
            match source.get_window(self.config.acquisition.vitals_window_s) {
                Window::Ready(ppg) => self.vitals.update(&ppg),
                Window::NotReady(_) => Vitals::default(),
            }
        } else {
            Vitals::default()
        };

        let snapshot = MetricsSnapshot::new(focus, fatigue, vitals);
        self.worn.accept(snapshot);
        self.stats.record(&snapshot);

        let focus_ema = self.focus_ema.update(snapshot.focus);
        let fatigue_ema = self.fatigue_ema.update(snapshot.fatigue);
        let event = self.policy.observe(now, focus_ema, fatigue_ema);
        if let Some(event) = event.as_ref() {
            self.notifier.notify(event);
        }

        self.report(now, snapshot, TickOutcome::Accepted, Some(bands), event)
    }

    fn missed(&mut self, now: f64, reason: MissReason) -> TickReport {
        // only observed low ticks count towards a break
        self.policy.interrupt();
        let hold = self.worn.miss();
        if hold == HoldOutcome::Expired {
            // output drops to zero: restart smoothing from the next accepted sample
            self.focus_ema.reseed(None);
            self.fatigue_ema.reseed(None);
            self.scorer.reset();
            self.vitals.reset();
        }
        let replayed = matches!(hold, HoldOutcome::Replay(_));
        self.report(
            now,
            hold.snapshot(),
            TickOutcome::Missed { reason, replayed },
            None,
            None,
        )
    }

    fn report(
        &self,
        now: f64,
        metrics: MetricsSnapshot,
        outcome: TickOutcome,
        bands: Option<BandPowers>,
        break_event: Option<BreakEvent>,
    ) -> TickReport {
        let phase = self.policy.phase(now);
        let focus_ema = self.focus_ema.value();
        let fatigue_ema = self.fatigue_ema.value();
        let status = match outcome {
            TickOutcome::WarmingUp => SessionStatus::SettlingIn,
            TickOutcome::Missed {
                replayed: false, ..
            } => SessionStatus::NotWorn,
            _ => SessionStatus::classify(
                true,
                phase,
                focus_ema.unwrap_or(metrics.focus),
                fatigue_ema.unwrap_or(metrics.fatigue),
                self.policy.fatigue_gate(),
            ),
        };
        TickReport {
            at_s: now,
            metrics,
            outcome,
            worn: self.worn.state(),
            status,
            focus_ema,
            fatigue_ema,
            bands,
            break_event,
        }
    }

    /// Latest metrics snapshot (pull-based read).
    pub fn read(&self) -> MetricsSnapshot {
        self.last_report.metrics
    }

    /// Latest per-electrode contact quality, if a window was ever analysed.
    pub fn quality(&self) -> Option<&ContactReport> {
        self.last_quality.as_ref()
    }

    pub fn last_report(&self) -> &TickReport {
        &self.last_report
    }

    pub fn policy_state(&self) -> &BreakPolicyState {
        self.policy.state()
    }

    pub fn policy_phase(&self, now: f64) -> PolicyPhase {
        self.policy.phase(now)
    }

    pub fn low_threshold(&self) -> f32 {
        self.policy.low_threshold()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn config(&self) -> &NeurotempoConfig {
        &self.config
    }

    /// End-of-session summary as of `now`.
    pub fn summary(&self, now: f64) -> SessionSummary {
        self.stats.summarize(
            self.clock.session_duration(now),
            self.baseline_focus,
            self.policy.state().breaks,
        )
    }

    /// Discard all session state; the next tick starts a new session.
    pub fn reset(&mut self) {
        let alpha = self.config.smoothing.ema_alpha;
        self.scorer.reset();
        self.vitals.reset();
        self.worn.reset();
        self.policy.reset(0.0);
        self.focus_ema = Ema::seeded(alpha, self.baseline_focus);
        self.fatigue_ema = Ema::seeded(alpha, FATIGUE_SEED);
        self.clock.end_session();
        self.stats = SessionStats::default();
        self.last_quality = None;
        self.last_report = TickReport::initial();
        log::info!("session state reset");
    }
}
