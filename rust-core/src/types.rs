//! Core data types for the wave estimation engine.
//!
//! This module defines the values that flow through the pipeline: sensor
//! samples coming in, spectra and moments in the middle, wave metrics and
//! forecasts going out.
//!
//! Design principle: if a concept exists, it gets a type. Raw tuples are
//! only used where the meaning is obvious from the field name.

use serde::{Deserialize, Serialize};

/// A single earth-frame acceleration sample, gravity already removed.
///
/// This is the input contract of [`crate::processor::WaveProcessor`]. It is
/// produced by [`crate::fusion::SensorFusion`] (or an external adapter) and
/// consumed exactly once, when it is pushed into the rolling buffers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    /// Monotonic timestamp in milliseconds.
    pub timestamp_ms: u64,
    /// Vertical (earth up) linear acceleration in m/s².
    pub vertical_accel: f64,
    /// Horizontal acceleration along the earth X axis in m/s².
    pub horizontal_x: f64,
    /// Horizontal acceleration along the earth Y axis in m/s².
    pub horizontal_y: f64,
    /// Rate the sample stream is delivered at, in Hz.
    pub sampling_rate_hz: f64,
}

impl SensorSample {
    /// Creates a new sample.
    pub fn new(
        timestamp_ms: u64,
        vertical_accel: f64,
        horizontal_x: f64,
        horizontal_y: f64,
        sampling_rate_hz: f64,
    ) -> Self {
        Self {
            timestamp_ms,
            vertical_accel,
            horizontal_x,
            horizontal_y,
            sampling_rate_hz,
        }
    }

    /// Creates a sample with vertical motion only.
    pub fn vertical(timestamp_ms: u64, vertical_accel: f64, sampling_rate_hz: f64) -> Self {
        Self::new(timestamp_ms, vertical_accel, 0.0, 0.0, sampling_rate_hz)
    }
}

/// A raw device-frame accelerometer reading, gravity included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawImuSample {
    /// Monotonic timestamp in milliseconds.
    pub timestamp_ms: u64,
    /// Accelerometer reading [x, y, z] in m/s², device frame.
    pub accel: [f64; 3],
    /// Delivery rate of the accelerometer stream in Hz.
    pub sampling_rate_hz: f64,
}

impl RawImuSample {
    pub fn new(timestamp_ms: u64, accel: [f64; 3], sampling_rate_hz: f64) -> Self {
        Self {
            timestamp_ms,
            accel,
            sampling_rate_hz,
        }
    }
}

/// A gyroscope yaw-rate reading paired with the magnetometer heading at that instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GyroSample {
    /// Monotonic timestamp in milliseconds.
    pub timestamp_ms: u64,
    /// Yaw rate about the earth vertical in rad/s, positive clockwise seen from above.
    pub yaw_rate_rad_s: f64,
    /// Magnetometer heading in degrees, 0 = north, clockwise.
    pub magnetometer_heading_deg: f64,
}

impl GyroSample {
    pub fn new(timestamp_ms: u64, yaw_rate_rad_s: f64, magnetometer_heading_deg: f64) -> Self {
        Self {
            timestamp_ms,
            yaw_rate_rad_s,
            magnetometer_heading_deg,
        }
    }
}

/// One-sided power spectrum: ordered (frequency, power) pairs.
///
/// Length is half the transform size. Frequencies are in Hz and strictly
/// increasing from 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectrumSample {
    /// (frequency Hz, power density) pairs.
    pub bins: Vec<(f64, f64)>,
}

impl SpectrumSample {
    pub fn new(bins: Vec<(f64, f64)>) -> Self {
        Self { bins }
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Frequency spacing between adjacent bins, 0 when fewer than two bins.
    pub fn resolution_hz(&self) -> f64 {
        match (self.bins.first(), self.bins.get(1)) {
            (Some(a), Some(b)) => b.0 - a.0,
            _ => 0.0,
        }
    }

    /// The (frequency, power) pair with the largest power, DC excluded.
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.bins
            .iter()
            .skip(1)
            .copied()
            .filter(|(_, p)| p.is_finite())
            .fold(None, |best: Option<(f64, f64)>, bin| match best {
                Some(b) if b.1 >= bin.1 => Some(b),
                _ => Some(bin),
            })
    }

    /// Sum of all power values.
    pub fn total_power(&self) -> f64 {
        self.bins.iter().map(|(_, p)| p).sum()
    }
}

/// Spectral moments (m0, m1, m2) of a displacement spectrum.
///
/// Invariant: `m0 >= 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpectralMoments {
    pub m0: f64,
    pub m1: f64,
    pub m2: f64,
}

impl SpectralMoments {
    pub fn new(m0: f64, m1: f64, m2: f64) -> Self {
        Self { m0, m1, m2 }
    }
}

/// Wave parameters derived from one set of spectral moments.
///
/// Zero periods mean "unknown", never "calm".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WaveEstimate {
    /// Significant wave height 4·√m0 in metres.
    pub height: f64,
    /// Mean period m0/m1 in seconds, 0 when m1 is not positive.
    pub mean_period: f64,
    /// Zero-upcrossing period √(m0/m2) in seconds, 0 when m2 is zero.
    pub zero_crossing_period: f64,
}

/// One processing-cycle output.
///
/// Height and period are exponentially smoothed against the previous cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveMetric {
    /// Smoothed significant wave height in metres.
    pub height: f64,
    /// Smoothed dominant (mean) period in seconds.
    pub period: f64,
    /// Propagation direction in degrees, [0, 360).
    pub direction: f64,
    /// Seconds since the first sample after construction or clear.
    pub elapsed_time: f64,
}

/// Forecast derived from the most recent wave metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    /// Big-wave confidence in [0, 1]; exactly 0 with insufficient history.
    pub confidence: f64,
    /// One-step linear extrapolation of the height series.
    pub predicted_next_height: Option<f64>,
    /// True when `confidence` exceeds the big-wave threshold.
    pub big_wave: bool,
    /// Exponentially smoothed confidence across evaluations.
    pub smoothed_confidence: f64,
}

/// Lifecycle of the rolling acceleration buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessorState {
    /// Nothing buffered.
    Idle,
    /// Fewer samples than one analysis window.
    Accumulating,
    /// At least one full analysis window is buffered.
    Ready,
}

impl ProcessorState {
    /// Classify a buffer fill level against the analysis window size.
    pub fn from_fill(len: usize, window_size: usize) -> Self {
        match len {
            0 => ProcessorState::Idle,
            n if n < window_size => ProcessorState::Accumulating,
            _ => ProcessorState::Ready,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processor_state_from_fill() {
        assert_eq!(ProcessorState::from_fill(0, 1024), ProcessorState::Idle);
        assert_eq!(ProcessorState::from_fill(1, 1024), ProcessorState::Accumulating);
        assert_eq!(ProcessorState::from_fill(1023, 1024), ProcessorState::Accumulating);
        assert_eq!(ProcessorState::from_fill(1024, 1024), ProcessorState::Ready);
        assert_eq!(ProcessorState::from_fill(2048, 1024), ProcessorState::Ready);
    }

    #[test]
    fn test_spectrum_peak_skips_dc() {
        let spectrum = SpectrumSample::new(vec![(0.0, 100.0), (0.1, 2.0), (0.2, 5.0), (0.3, 1.0)]);
        assert_eq!(spectrum.peak(), Some((0.2, 5.0)));
        assert!((spectrum.resolution_hz() - 0.1).abs() < 1e-12);
        assert!((spectrum.total_power() - 108.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_spectrum() {
        let spectrum = SpectrumSample::default();
        assert!(spectrum.is_empty());
        assert_eq!(spectrum.peak(), None);
        assert_eq!(spectrum.resolution_hz(), 0.0);
    }

    #[test]
    fn test_wave_metric_serializes() {
        let metric = WaveMetric {
            height: 1.5,
            period: 8.0,
            direction: 270.0,
            elapsed_time: 42.0,
        };
        let json = serde_json::to_string(&metric).unwrap();
        let back: WaveMetric = serde_json::from_str(&json).unwrap();
        assert_eq!(metric, back);
    }
}
