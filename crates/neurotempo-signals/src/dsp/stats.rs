//! Time-domain channel statistics.

pub fn mean(signal: &[f32]) -> f32 {
    if signal.is_empty() {
        return 0.0;
    }
    signal.iter().sum::<f32>() / signal.len() as f32
}

/// Population standard deviation.
pub fn std(signal: &[f32]) -> f32 {
    if signal.is_empty() {
        return 0.0;
    }
    let m = mean(signal);
    let variance = signal.iter().map(|x| (x - m).powi(2)).sum::<f32>() / signal.len() as f32;
    variance.sqrt()
}

pub fn peak_to_peak(signal: &[f32]) -> f32 {
    let (lo, hi) = signal
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if signal.is_empty() {
        0.0
    } else {
        hi - lo
    }
}

/// Fraction of adjacent sample pairs that differ by at most `epsilon`.
///
/// High values mean a saturated (railed) or heavily quantized channel.
pub fn repeat_ratio(signal: &[f32], epsilon: f32) -> f32 {
    if signal.len() < 2 {
        return 0.0;
    }
    let repeats = signal
        .windows(2)
        .filter(|w| (w[1] - w[0]).abs() <= epsilon)
        .count();
    repeats as f32 / (signal.len() - 1) as f32
}
