//! Raw acquisition frames and the fixed-duration sample window.
//!
//! The transport collaborator hands the core a channels x samples matrix
//! (`RawFrame`) together with a `ChannelLayout` saying which rows are EEG,
//! PPG or the per-sample timestamp. `SampleBuffer` is the ring store a
//! transport (or the simulator) keeps, and `SampleBuffer::get_window` is the
//! "most recent N seconds" extraction the pipeline pulls every tick.
//!
//! Raw values stay `f64` so timestamp rows keep their precision; DSP code
//! converts the rows it needs to `f32`.

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

/// What a row of the raw matrix carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelRole {
    Eeg,
    PpgAmbient,
    PpgIr,
    PpgRed,
    Timestamp,
}

/// Row assignment for a raw frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelLayout {
    /// EEG rows in raw hardware order
    pub eeg: Vec<usize>,
    pub ppg_ambient: Option<usize>,
    pub ppg_ir: Option<usize>,
    pub ppg_red: Option<usize>,
    pub timestamp: Option<usize>,
}

impl ChannelLayout {
    /// Layout with only EEG rows `0..n_eeg` and nothing else.
    pub fn eeg_only(n_eeg: usize) -> Self {
        Self {
            eeg: (0..n_eeg).collect(),
            ppg_ambient: None,
            ppg_ir: None,
            ppg_red: None,
            timestamp: None,
        }
    }

    /// Row indices carrying `role`, in layout order.
    pub fn indices(&self, role: ChannelRole) -> Vec<usize> {
        match role {
            ChannelRole::Eeg => self.eeg.clone(),
            ChannelRole::PpgAmbient => self.ppg_ambient.into_iter().collect(),
            ChannelRole::PpgIr => self.ppg_ir.into_iter().collect(),
            ChannelRole::PpgRed => self.ppg_red.into_iter().collect(),
            ChannelRole::Timestamp => self.timestamp.into_iter().collect(),
        }
    }

    /// Smallest row count a matrix needs to satisfy this layout.
    pub fn min_rows(&self) -> usize {
        self.eeg
            .iter()
            .copied()
            .chain(self.ppg_ambient)
            .chain(self.ppg_ir)
            .chain(self.ppg_red)
            .chain(self.timestamp)
            .max()
            .map(|m| m + 1)
            .unwrap_or(0)
    }

    pub fn has_ppg(&self) -> bool {
        self.ppg_ir.is_some()
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    #[error("layout needs {need} rows but matrix has {have}")]
    LayoutMismatch { need: usize, have: usize },
    #[error("sampling rate must be positive, got {0}")]
    InvalidSamplingRate(f32),
    #[error("sample has {got} channels, buffer expects {expected}")]
    SampleWidth { expected: usize, got: usize },
    #[error("channel {row} out of range for a {width}-channel buffer")]
    UnknownChannel { row: usize, width: usize },
}

/// One acquisition window: channels x samples, read-only for the core.
#[derive(Debug, Clone)]
pub struct RawFrame {
    data: Array2<f64>,
    sampling_rate: f32,
    layout: ChannelLayout,
}

impl RawFrame {
    pub fn new(
        data: Array2<f64>,
        sampling_rate: f32,
        layout: ChannelLayout,
    ) -> Result<Self, FrameError> {
        if !(sampling_rate > 0.0) {
            return Err(FrameError::InvalidSamplingRate(sampling_rate));
        }
        let need = layout.min_rows();
        if data.nrows() < need {
            return Err(FrameError::LayoutMismatch {
                need,
                have: data.nrows(),
            });
        }
        Ok(Self {
            data,
            sampling_rate,
            layout,
        })
    }

    pub fn data(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    pub fn sampling_rate(&self) -> f32 {
        self.sampling_rate
    }

    pub fn layout(&self) -> &ChannelLayout {
        &self.layout
    }

    pub fn n_samples(&self) -> usize {
        self.data.ncols()
    }

    pub fn duration_s(&self) -> f32 {
        self.n_samples() as f32 / self.sampling_rate
    }

    /// EEG rows (raw hardware order) converted to `f32`.
    pub fn eeg(&self) -> Array2<f32> {
        self.data
            .select(Axis(0), &self.layout.eeg)
            .mapv(|v| v as f32)
    }

    /// A single-row role as `f32` samples. `None` when the layout lacks it.
    pub fn channel(&self, role: ChannelRole) -> Option<Vec<f32>> {
        let row = match role {
            ChannelRole::Eeg => return None,
            ChannelRole::PpgAmbient => self.layout.ppg_ambient?,
            ChannelRole::PpgIr => self.layout.ppg_ir?,
            ChannelRole::PpgRed => self.layout.ppg_red?,
            ChannelRole::Timestamp => self.layout.timestamp?,
        };
        Some(self.data.row(row).iter().map(|&v| v as f32).collect())
    }

    /// Per-sample timestamps at full precision.
    pub fn timestamps(&self) -> Option<ArrayView1<'_, f64>> {
        self.layout.timestamp.map(|row| self.data.row(row))
    }

    /// Most recent `duration_s` of this frame, or `None` if it is shorter.
    pub fn tail(&self, duration_s: f32) -> Option<RawFrame> {
        let need = samples_for(duration_s, self.sampling_rate);
        let n = self.n_samples();
        if need > n {
            return None;
        }
        let data = self
            .data
            .slice(ndarray::s![.., (n - need)..])
            .to_owned();
        Some(RawFrame {
            data,
            sampling_rate: self.sampling_rate,
            layout: self.layout.clone(),
        })
    }
}

/// Why a window could not be produced this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotReadyReason {
    /// Still filling up after (re)connect
    Buffering { have: usize, need: usize },
    /// Transport is connected but no samples arrived since the last tick
    Stalled,
    /// Transport is not streaming at all
    Disconnected,
}

/// Result of asking the transport for a window.
#[derive(Debug, Clone)]
pub enum Window {
    Ready(RawFrame),
    NotReady(NotReadyReason),
}

impl Window {
    pub fn is_ready(&self) -> bool {
        matches!(self, Window::Ready(_))
    }

    pub fn frame(&self) -> Option<&RawFrame> {
        match self {
            Window::Ready(frame) => Some(frame),
            Window::NotReady(_) => None,
        }
    }
}

/// Channel-selected slice of a `SampleBuffer`.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowSlice {
    Ready(Array2<f64>),
    /// Expected transient on first connection, not an error
    InsufficientData { have: usize, need: usize },
}

/// Number of samples covering `duration_s` at `fs`, at least one.
pub fn samples_for(duration_s: f32, fs: f32) -> usize {
    ((duration_s * fs).round() as usize).max(1)
}

/// Bounded multichannel ring store; oldest samples are evicted on insert.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    layout: ChannelLayout,
    sampling_rate: f32,
    width: usize,
    capacity: usize,
    columns: VecDeque<Vec<f64>>,
}

impl SampleBuffer {
    /// # Arguments
    /// * `layout` - row roles; the buffer stores `layout.min_rows()` channels
    /// * `sampling_rate` - samples per second per channel
    /// * `capacity_s` - seconds of history kept
    pub fn new(
        layout: ChannelLayout,
        sampling_rate: f32,
        capacity_s: f32,
    ) -> Result<Self, FrameError> {
        if !(sampling_rate > 0.0) {
            return Err(FrameError::InvalidSamplingRate(sampling_rate));
        }
        let capacity = samples_for(capacity_s, sampling_rate);
        Ok(Self {
            width: layout.min_rows(),
            layout,
            sampling_rate,
            capacity,
            columns: VecDeque::with_capacity(capacity),
        })
    }

    pub fn sampling_rate(&self) -> f32 {
        self.sampling_rate
    }

    pub fn layout(&self) -> &ChannelLayout {
        &self.layout
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.columns.clear();
    }

    /// Append one multichannel sample (one value per row).
    pub fn push_sample(&mut self, sample: &[f64]) -> Result<(), FrameError> {
        if sample.len() != self.width {
            return Err(FrameError::SampleWidth {
                expected: self.width,
                got: sample.len(),
            });
        }
        if self.columns.len() == self.capacity {
            self.columns.pop_front();
        }
        self.columns.push_back(sample.to_vec());
        Ok(())
    }

    /// Append a channels x samples chunk.
    pub fn push_chunk(&mut self, chunk: ArrayView2<'_, f64>) -> Result<(), FrameError> {
        if chunk.nrows() != self.width {
            return Err(FrameError::SampleWidth {
                expected: self.width,
                got: chunk.nrows(),
            });
        }
        for column in chunk.columns() {
            self.push_sample(&column.to_vec())?;
        }
        Ok(())
    }

    /// Most recent `duration_s` seconds of the selected rows.
    ///
    /// A selector row outside the buffer is an error; too few samples is not.
    pub fn get_window(
        &self,
        selector: &[usize],
        duration_s: f32,
    ) -> Result<WindowSlice, FrameError> {
        if let Some(&row) = selector.iter().find(|&&row| row >= self.width) {
            return Err(FrameError::UnknownChannel {
                row,
                width: self.width,
            });
        }
        let need = samples_for(duration_s, self.sampling_rate);
        let have = self.columns.len();
        if have < need {
            return Ok(WindowSlice::InsufficientData { have, need });
        }
        let start = have - need;
        let mut out = Array2::<f64>::zeros((selector.len(), need));
        for (col, sample) in self.columns.range(start..).enumerate() {
            for (r, &row) in selector.iter().enumerate() {
                out[[r, col]] = sample[row];
            }
        }
        Ok(WindowSlice::Ready(out))
    }

    /// Most recent `duration_s` seconds of every row as a `RawFrame`.
    pub fn frame(&self, duration_s: f32) -> Window {
        let all: Vec<usize> = (0..self.width).collect();
        match self.get_window(&all, duration_s) {
            Ok(WindowSlice::Ready(data)) => {
                match RawFrame::new(data, self.sampling_rate, self.layout.clone()) {
                    Ok(frame) => Window::Ready(frame),
                    Err(e) => {
                        log::warn!("sample buffer produced an invalid frame: {}", e);
                        Window::NotReady(NotReadyReason::Disconnected)
                    }
                }
            }
            Ok(WindowSlice::InsufficientData { have, need }) => {
                Window::NotReady(NotReadyReason::Buffering { have, need })
            }
            Err(e) => {
                log::warn!("sample buffer window failed: {}", e);
                Window::NotReady(NotReadyReason::Disconnected)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> ChannelLayout {
        ChannelLayout {
            eeg: vec![0, 1],
            ppg_ambient: None,
            ppg_ir: Some(2),
            ppg_red: None,
            timestamp: Some(3),
        }
    }

    #[test]
    fn test_insufficient_then_ready() {
        let mut buf = SampleBuffer::new(layout(), 4.0, 10.0).unwrap();
        for i in 0..6 {
            buf.push_sample(&[i as f64, -(i as f64), 1.0, i as f64 * 0.25])
                .unwrap();
        }

        // 2 s at 4 Hz needs 8 samples
        assert_eq!(
            buf.get_window(&[0], 2.0),
            Ok(WindowSlice::InsufficientData { have: 6, need: 8 })
        );

        for i in 6..10 {
            buf.push_sample(&[i as f64, -(i as f64), 1.0, i as f64 * 0.25])
                .unwrap();
        }
        match buf.get_window(&[1, 0], 1.0) {
            Ok(WindowSlice::Ready(m)) => {
                assert_eq!(m.dim(), (2, 4));
                // most recent samples, selector order preserved
                assert_eq!(m[[0, 3]], -9.0);
                assert_eq!(m[[1, 0]], 6.0);
            }
            other => panic!("expected ready window, got {:?}", other),
        }
    }

    #[test]
    fn test_ring_eviction() {
        let mut buf = SampleBuffer::new(ChannelLayout::eeg_only(1), 2.0, 2.0).unwrap();
        assert_eq!(buf.capacity(), 4);
        for i in 0..10 {
            buf.push_sample(&[i as f64]).unwrap();
        }
        assert_eq!(buf.len(), 4);
        match buf.get_window(&[0], 2.0) {
            Ok(WindowSlice::Ready(m)) => assert_eq!(m.row(0).to_vec(), vec![6.0, 7.0, 8.0, 9.0]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unknown_channel_is_an_error() {
        let buf = SampleBuffer::new(layout(), 4.0, 1.0).unwrap();
        // still buffering, but the selector is wrong regardless
        assert_eq!(
            buf.get_window(&[0, 4], 1.0),
            Err(FrameError::UnknownChannel { row: 4, width: 4 })
        );
        assert!(matches!(
            buf.get_window(&[3], 1.0),
            Ok(WindowSlice::InsufficientData { have: 0, need: 4 })
        ));
    }

    #[test]
    fn test_wrong_width_rejected() {
        let mut buf = SampleBuffer::new(layout(), 4.0, 1.0).unwrap();
        assert!(buf.push_sample(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_frame_roles() {
        let mut buf = SampleBuffer::new(layout(), 4.0, 4.0).unwrap();
        for i in 0..8 {
            buf.push_sample(&[1.0, 2.0, 3.0, 1_700_000_000.0 + i as f64 * 0.25])
                .unwrap();
        }
        let frame = match buf.frame(2.0) {
            Window::Ready(f) => f,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(frame.eeg().dim(), (2, 8));
        assert_eq!(frame.channel(ChannelRole::PpgIr).unwrap(), vec![3.0; 8]);
        assert!(frame.channel(ChannelRole::PpgRed).is_none());
        let ts = frame.timestamps().unwrap();
        assert!(ts[7] - ts[0] > 1.7 && ts[7] - ts[0] < 1.8);
        assert_eq!(frame.tail(1.0).unwrap().n_samples(), 4);
        assert!(frame.tail(3.0).is_none());
    }

    #[test]
    fn test_layout_mismatch() {
        let data = Array2::<f64>::zeros((2, 10));
        assert!(matches!(
            RawFrame::new(data, 256.0, layout()),
            Err(FrameError::LayoutMismatch { need: 4, have: 2 })
        ));
    }
}
