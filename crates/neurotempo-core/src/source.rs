//! Signal source capability and a deterministic simulated headset.
//!
//! The pipeline depends only on `SignalSource`; a real transport implements
//! it over the vendor driver, tests and the CLI use `SimulatedHeadset`.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use neurotempo_signals::{ChannelLayout, ChannelRole, FrameError, NotReadyReason, SampleBuffer, Window};

/// Minimal capability the pipeline needs from a transport.
pub trait SignalSource {
    fn sampling_rate(&self) -> f32;

    fn channel_indices(&self, role: ChannelRole) -> Vec<usize>;

    /// Most recent `duration_s` of every channel, or why it is not available.
    fn get_window(&mut self, duration_s: f32) -> Window;
}

/// What the simulated wearer is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// Worn, beta/alpha-rich EEG, steady pulse
    Focused,
    /// Worn, theta/delta-heavy EEG
    Drowsy,
    /// Headset on the desk: large drifting noise on every electrode
    OffHead,
    /// Electrodes railed to a constant value
    Flatline,
    /// Worn, but swamped by EMG-like broadband beta
    MotionArtifact,
    /// Link stalls: no samples arrive
    Dropout,
}

/// A scenario held for `duration_s` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    pub scenario: Scenario,
    pub duration_s: f64,
}

impl ScriptStep {
    pub fn new(scenario: Scenario, duration_s: f64) -> Self {
        Self {
            scenario,
            duration_s,
        }
    }
}

const EEG_ROWS: usize = 4;
const ROW_AMBIENT: usize = 4;
const ROW_IR: usize = 5;
const ROW_RED: usize = 6;
const ROW_TIMESTAMP: usize = 7;
const EEG_OFFSET_UV: f64 = 800.0;
const EPOCH_S: f64 = 1_700_000_000.0;

/// Simulated 4-electrode headset with ambient / IR / red PPG.
pub struct SimulatedHeadset {
    buffer: SampleBuffer,
    rng: StdRng,
    script: Vec<ScriptStep>,
    sampling_rate: f32,
    heart_rate_bpm: f64,
    /// Samples generated so far
    sample_index: u64,
    /// Simulated time (s)
    elapsed_s: f64,
    stalled: bool,
}

impl SimulatedHeadset {
    /// # Arguments
    /// * `seed` - noise seed; equal seeds give identical streams
    /// * `script` - scenario sequence; the last step holds forever
    pub fn new(seed: u64, script: Vec<ScriptStep>) -> Result<Self, FrameError> {
        Self::with_rate(seed, script, 256.0)
    }

    pub fn with_rate(seed: u64, script: Vec<ScriptStep>, sampling_rate: f32) -> Result<Self, FrameError> {
        let buffer = SampleBuffer::new(Self::layout(), sampling_rate, 10.0)?;
        Ok(Self {
            buffer,
            rng: StdRng::seed_from_u64(seed),
            script,
            sampling_rate,
            heart_rate_bpm: 68.0,
            sample_index: 0,
            elapsed_s: 0.0,
            stalled: false,
        })
    }

    pub fn with_heart_rate(mut self, bpm: f64) -> Self {
        self.heart_rate_bpm = bpm;
        self
    }

    /// Row layout: EEG 0..4, PPG ambient/IR/red 4..7, timestamp 7.
    pub fn layout() -> ChannelLayout {
        ChannelLayout {
            eeg: (0..EEG_ROWS).collect(),
            ppg_ambient: Some(ROW_AMBIENT),
            ppg_ir: Some(ROW_IR),
            ppg_red: Some(ROW_RED),
            timestamp: Some(ROW_TIMESTAMP),
        }
    }

    pub fn elapsed_s(&self) -> f64 {
        self.elapsed_s
    }

    /// Scenario active at simulated time `t`.
    pub fn scenario_at(&self, t: f64) -> Scenario {
        let mut end = 0.0;
        for step in &self.script {
            end += step.duration_s;
            if t < end {
                return step.scenario;
            }
        }
        self.script
            .last()
            .map(|s| s.scenario)
            .unwrap_or(Scenario::Focused)
    }

    /// Generate `dt_s` seconds of samples.
    pub fn advance(&mut self, dt_s: f64) -> Result<(), FrameError> {
        let fs = self.sampling_rate as f64;
        let target = ((self.elapsed_s + dt_s) * fs).round() as u64;
        let mut pushed = 0usize;

        while self.sample_index < target {
            let t = self.sample_index as f64 / fs;
            let scenario = self.scenario_at(t);
            self.sample_index += 1;
            if scenario == Scenario::Dropout {
                continue;
            }
            let sample = self.sample(scenario, t);
            self.buffer.push_sample(&sample)?;
            pushed += 1;
        }

        self.elapsed_s += dt_s;
        self.stalled = pushed == 0;
        Ok(())
    }

    fn sample(&mut self, scenario: Scenario, t: f64) -> Vec<f64> {
        let mut row = vec![0.0; ROW_TIMESTAMP + 1];

        for (ch, value) in row.iter_mut().take(EEG_ROWS).enumerate() {
            let phase = ch as f64 * 0.7;
            let tone = |freq: f64, amp: f64| amp * (2.0 * PI * freq * t + phase).sin();
            let noise = self.rng.gen_range(-1.0..1.0);
            *value = match scenario {
                Scenario::Focused => {
                    EEG_OFFSET_UV
                        + tone(2.0, 6.0)
                        + tone(6.0, 5.0)
                        + tone(10.0, 8.0)
                        + tone(20.0, 10.0)
                        + tone(60.0, 0.5)
                        + 5.0 * noise
                }
                Scenario::Drowsy => {
                    EEG_OFFSET_UV
                        + tone(2.0, 10.0)
                        + tone(6.0, 14.0)
                        + tone(9.0, 10.0)
                        + tone(18.0, 3.0)
                        + tone(60.0, 0.5)
                        + 5.0 * noise
                }
                Scenario::OffHead => {
                    EEG_OFFSET_UV + tone(0.3, 350.0) + tone(60.0, 200.0) + 400.0 * noise
                }
                Scenario::Flatline => 1682.0,
                Scenario::MotionArtifact => {
                    EEG_OFFSET_UV
                        + tone(6.0, 3.0)
                        + tone(10.0, 3.0)
                        + tone(18.0, 25.0)
                        + tone(24.0, 30.0)
                        + 5.0 * noise
                }
                Scenario::Dropout => EEG_OFFSET_UV,
            };
        }

        let ambient = 100.0 + 2.0 * self.rng.gen_range(-1.0..1.0);
        let pulse = (2.0 * PI * self.heart_rate_bpm / 60.0 * t).sin();
        let (ir, red) = match scenario {
            Scenario::Focused | Scenario::Drowsy | Scenario::MotionArtifact => (
                ambient + 20_000.0 + 300.0 * pulse,
                ambient + 15_000.0 + 120.0 * pulse,
            ),
            _ => (ambient, ambient),
        };
        row[ROW_AMBIENT] = ambient;
        row[ROW_IR] = ir;
        row[ROW_RED] = red;
        row[ROW_TIMESTAMP] = EPOCH_S + t;
        row
    }
}

impl SignalSource for SimulatedHeadset {
    fn sampling_rate(&self) -> f32 {
        self.sampling_rate
    }

    fn channel_indices(&self, role: ChannelRole) -> Vec<usize> {
        self.buffer.layout().indices(role)
    }

    fn get_window(&mut self, duration_s: f32) -> Window {
        if self.stalled {
            return Window::NotReady(NotReadyReason::Stalled);
        }
        self.buffer.frame(duration_s)
    }
}

/// Source that replays one fixed frame forever; the frozen-transport case.
pub struct FrozenSource {
    data: Array2<f64>,
    layout: ChannelLayout,
    sampling_rate: f32,
}

impl FrozenSource {
    pub fn new(data: Array2<f64>, layout: ChannelLayout, sampling_rate: f32) -> Self {
        Self {
            data,
            layout,
            sampling_rate,
        }
    }
}

impl SignalSource for FrozenSource {
    fn sampling_rate(&self) -> f32 {
        self.sampling_rate
    }

    fn channel_indices(&self, role: ChannelRole) -> Vec<usize> {
        self.layout.indices(role)
    }

    fn get_window(&mut self, duration_s: f32) -> Window {
        match neurotempo_signals::RawFrame::new(self.data.clone(), self.sampling_rate, self.layout.clone()) {
            Ok(frame) => match frame.tail(duration_s) {
                Some(tail) => Window::Ready(tail),
                None => Window::NotReady(NotReadyReason::Buffering {
                    have: frame.n_samples(),
                    need: neurotempo_signals::samples_for(duration_s, self.sampling_rate),
                }),
            },
            Err(e) => {
                log::warn!("frozen source holds an invalid frame: {}", e);
                Window::NotReady(NotReadyReason::Disconnected)
            }
        }
    }
}
