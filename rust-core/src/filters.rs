//! Time-domain filters for vertical acceleration windows.
//!
//! All filters are pure functions over slices and always return a vector
//! the same length as their input. Centered rolling statistics are only
//! defined where a full window fits; positions closer to an edge than half
//! a window take the nearest defined value.
//!
//! Undersized input (empty window, or fewer samples than the window) is
//! returned unchanged. The streaming pipeline relies on this to stay well
//! defined while buffers are still filling.

use std::f64::consts::PI;

/// Subtract a centered rolling mean, removing drift slower than the window.
pub fn high_pass(data: &[f64], window_size: usize) -> Vec<f64> {
    if is_undersized(data, window_size) {
        return data.to_vec();
    }
    let trend = rolling_mean(data, window_size);
    let rolled = spread(&trend, data.len(), window_size);
    data.iter().zip(rolled).map(|(x, m)| x - m).collect()
}

/// Centered sliding-window median.
pub fn median_filter(data: &[f64], window_size: usize) -> Vec<f64> {
    if is_undersized(data, window_size) {
        return data.to_vec();
    }
    let mut scratch = Vec::with_capacity(window_size);
    let medians: Vec<f64> = data
        .windows(window_size)
        .map(|w| {
            scratch.clear();
            scratch.extend_from_slice(w);
            median(&mut scratch)
        })
        .collect();
    spread(&medians, data.len(), window_size)
}

/// Centered sliding mean.
pub fn moving_average(data: &[f64], window_size: usize) -> Vec<f64> {
    if is_undersized(data, window_size) {
        return data.to_vec();
    }
    let means = rolling_mean(data, window_size);
    spread(&means, data.len(), window_size)
}

/// Apply a Hann taper: sample i is scaled by 0.5·(1 − cos(2πi/(n−1))).
pub fn hanning_window(data: &[f64]) -> Vec<f64> {
    let n = data.len();
    if n < 2 {
        return data.to_vec();
    }
    let denom = (n - 1) as f64;
    data.iter()
        .enumerate()
        .map(|(i, x)| x * 0.5 * (1.0 - (2.0 * PI * i as f64 / denom).cos()))
        .collect()
}

/// Root-mean-square amplitude, 0 for an empty slice.
pub fn rms(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    (data.iter().map(|x| x * x).sum::<f64>() / data.len() as f64).sqrt()
}

fn is_undersized(data: &[f64], window_size: usize) -> bool {
    window_size == 0 || data.len() < window_size
}

/// Mean of every full window, in order of window start. Running sum, O(n).
///
/// A non-finite sample only poisons the windows that contain it: once the
/// running sum is non-finite it is recomputed from the window itself.
fn rolling_mean(data: &[f64], window_size: usize) -> Vec<f64> {
    let w = window_size as f64;
    let mut sum: f64 = data[..window_size].iter().sum();
    let mut out = Vec::with_capacity(data.len() - window_size + 1);
    out.push(sum / w);
    for i in window_size..data.len() {
        let start = i + 1 - window_size;
        sum = if sum.is_finite() {
            sum + data[i] - data[i - window_size]
        } else {
            data[start..=i].iter().sum()
        };
        out.push(sum / w);
    }
    out
}

/// Map per-window statistics onto window centers, replicating edge values.
///
/// `stats[s]` belongs to the window starting at `s`, centered at `s + half`.
fn spread(stats: &[f64], len: usize, window_size: usize) -> Vec<f64> {
    let half = window_size / 2;
    let last = stats.len() - 1;
    (0..len)
        .map(|i| stats[i.saturating_sub(half).min(last)])
        .collect()
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
