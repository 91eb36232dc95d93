//! Wave estimation pipeline orchestrating all processing stages.
//!
//! This module drives the flow from earth-frame acceleration samples to
//! smoothed wave metrics.
//!
//! # Architecture
//!
//! Each processing cycle runs on a snapshot of the rolling buffers:
//! 1. **High-pass**: remove slow drift from the whole vertical buffer
//! 2. **Segmentation**: overlapping windows (1024 samples, 50% overlap)
//! 3. **Gating**: drop windows that are too still or clipped (RMS gate)
//! 4. **Spectral**: median → moving average → Hann → FFT → PSD → moments
//! 5. **Aggregation**: average finite heights and periods across windows
//! 6. **Direction**: cross-spectrum direction, smoothed, blended with heading
//! 7. **Smoothing**: exponential smoothing against the previous cycle
//!
//! Insufficient data is never an error: the cycle simply yields `None`.
//!
//! # States
//!
//! Idle (empty) → Accumulating (under one window) → Ready (at least one
//! window). `clear()` returns to Idle.

use tracing::{debug, info, trace, warn};

use crate::buffer::AccelerationBuffer;
use crate::config::WaveConfig;
use crate::error::Result;
use crate::fft;
use crate::filters::{hanning_window, high_pass, median_filter, moving_average, rms};
use crate::fusion::{angular_difference, circular_mean, normalize_degrees};
use crate::spectral::SpectralAnalyzer;
use crate::types::{ProcessorState, SensorSample, WaveEstimate, WaveMetric};
use crate::zero_crossing;

/// Output of one accepted analysis window.
#[derive(Debug, Clone, Copy)]
struct WindowAnalysis {
    estimate: WaveEstimate,
    zero_crossing_period: f64,
}

/// Streaming wave estimator.
///
/// Owns the acceleration buffers and all smoothing state. Not thread-safe
/// on its own; see [`crate::shared::SharedWaveProcessor`].
pub struct WaveProcessor {
    config: WaveConfig,
    analyzer: SpectralAnalyzer,
    buffer: AccelerationBuffer,

    sampling_rate_hz: f64,
    first_timestamp_ms: Option<u64>,
    last_timestamp_ms: u64,

    // Smoothing state, None until the first successful cycle
    smoothed_height: Option<f64>,
    smoothed_period: Option<f64>,
    smoothed_fft_direction: Option<f64>,
    current_direction: Option<f64>,

    // Tracked but not merged into the reported period
    last_zero_crossing_period: f64,
    accepted_windows: usize,

    history: Vec<WaveMetric>,
}

impl WaveProcessor {
    /// Creates a processor from a validated configuration.
    pub fn new(config: WaveConfig) -> Result<Self> {
        config.validate()?;
        let analyzer = SpectralAnalyzer::new(&config.spectral)?;
        Ok(Self::build(config, analyzer))
    }

    fn build(config: WaveConfig, analyzer: SpectralAnalyzer) -> Self {
        Self {
            analyzer,
            buffer: AccelerationBuffer::new(config.buffer.capacity),
            sampling_rate_hz: config.sampling.default_rate_hz,
            first_timestamp_ms: None,
            last_timestamp_ms: 0,
            smoothed_height: None,
            smoothed_period: None,
            smoothed_fft_direction: None,
            current_direction: None,
            last_zero_crossing_period: f64::NAN,
            accepted_windows: 0,
            history: Vec::with_capacity(config.buffer.history_capacity),
            config,
        }
    }

    /// Appends one sample, evicting the oldest beyond capacity.
    pub fn add_sample(&mut self, sample: &SensorSample) {
        let rate = self.config.sampling.clamp_rate(sample.sampling_rate_hz);
        if rate != sample.sampling_rate_hz && rate != self.sampling_rate_hz {
            warn!(reported = sample.sampling_rate_hz, used = rate, "sampling rate clamped");
        }
        self.sampling_rate_hz = rate;

        if self.first_timestamp_ms.is_none() {
            self.first_timestamp_ms = Some(sample.timestamp_ms);
        }
        self.last_timestamp_ms = sample.timestamp_ms;

        self.buffer.push(sample);
    }

    /// Runs one analysis cycle over the buffered samples.
    ///
    /// `gyro_heading` is an externally maintained heading in degrees. When
    /// present it is averaged with the spectral direction.
    ///
    /// Returns `None` if fewer than one window of samples is buffered or
    /// no window survives gating.
    pub fn process_cycle(&mut self, gyro_heading: Option<f64>) -> Option<WaveMetric> {
        let window_size = self.config.buffer.window_size;
        let snapshot = self.buffer.snapshot();
        if snapshot.vertical.len() < window_size {
            debug!(
                buffered = snapshot.vertical.len(),
                needed = window_size,
                "skipping cycle: insufficient data"
            );
            return None;
        }

        let rate = self.sampling_rate_hz;
        let filtered = high_pass(&snapshot.vertical, self.config.filters.high_pass_window);

        let mut heights = Vec::new();
        let mut periods = Vec::new();
        let mut zero_crossings = Vec::new();
        for start in snapshot.window_starts(window_size, self.config.buffer.stride) {
            let window = &filtered[start..start + window_size];
            let Some(analysis) = self.analyze_window(window, rate) else {
                continue;
            };
            if analysis.estimate.height.is_finite() {
                heights.push(analysis.estimate.height);
            }
            if analysis.estimate.mean_period.is_finite() {
                periods.push(analysis.estimate.mean_period);
            }
            if analysis.zero_crossing_period.is_finite() {
                zero_crossings.push(analysis.zero_crossing_period);
            }
        }

        self.accepted_windows = heights.len();
        self.last_zero_crossing_period = mean(&zero_crossings).unwrap_or(f64::NAN);

        let (Some(raw_height), Some(raw_period)) = (mean(&heights), mean(&periods)) else {
            debug!("skipping cycle: no usable windows");
            return None;
        };

        let direction = self.update_direction(
            self.analyzer.direction(&snapshot.horizontal_x, &snapshot.horizontal_y),
            gyro_heading,
        );

        let smoothing = &self.config.smoothing;
        let height = exponential(self.smoothed_height, raw_height, smoothing.height_alpha);
        let period = exponential(self.smoothed_period, raw_period, smoothing.period_alpha);
        self.smoothed_height = Some(height);
        self.smoothed_period = Some(period);

        let metric = WaveMetric {
            height,
            period,
            direction,
            elapsed_time: self.elapsed_time(),
        };
        self.push_history(metric);

        debug!(
            height,
            period,
            direction,
            windows = self.accepted_windows,
            "wave metric"
        );
        Some(metric)
    }

    /// Resets all buffers and state to Idle.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.sampling_rate_hz = self.config.sampling.default_rate_hz;
        self.first_timestamp_ms = None;
        self.last_timestamp_ms = 0;
        self.smoothed_height = None;
        self.smoothed_period = None;
        self.smoothed_fft_direction = None;
        self.current_direction = None;
        self.last_zero_crossing_period = f64::NAN;
        self.accepted_windows = 0;
        self.history.clear();
        info!("wave processor cleared");
    }

    /// Filter, transform and measure one window. `None` if gated out.
    fn analyze_window(&self, window: &[f64], rate: f64) -> Option<WindowAnalysis> {
        let level = rms(window);
        let gating = &self.config.gating;
        if !(gating.min_rms..=gating.max_rms).contains(&level) {
            trace!(rms = level, "window rejected");
            return None;
        }

        let filters = &self.config.filters;
        let smoothed = moving_average(
            &median_filter(window, filters.median_window),
            filters.moving_average_window,
        );
        let zero_crossing_period = zero_crossing::period(&smoothed, rate);

        let n = window.len();
        let spectrum = fft::forward(&hanning_window(&smoothed), n).ok()?;
        let psd = SpectralAnalyzer::density(&spectrum, n, rate);
        let moments = self.analyzer.moments(&psd, rate, true);

        Some(WindowAnalysis {
            estimate: SpectralAnalyzer::metrics(moments),
            zero_crossing_period,
        })
    }

    /// Smooth the spectral direction against the previous one, then blend with heading.
    fn update_direction(&mut self, raw: f64, gyro_heading: Option<f64>) -> f64 {
        let smoothing = &self.config.smoothing;
        let fft_direction = match self.smoothed_fft_direction {
            Some(previous) => {
                let delta = angular_difference(raw, previous);
                if delta.abs() < smoothing.direction_snap_deg {
                    normalize_degrees(previous + smoothing.direction_alpha * delta)
                } else {
                    // A large jump is a change of sea state, not noise.
                    raw
                }
            }
            None => raw,
        };
        self.smoothed_fft_direction = Some(fft_direction);

        let direction = match gyro_heading.filter(|h| h.is_finite()) {
            Some(heading) => circular_mean(fft_direction, normalize_degrees(heading)),
            None => fft_direction,
        };
        self.current_direction = Some(direction);
        direction
    }

    fn push_history(&mut self, metric: WaveMetric) {
        if self.history.len() >= self.config.buffer.history_capacity {
            self.history.remove(0);
        }
        self.history.push(metric);
    }

    fn elapsed_time(&self) -> f64 {
        match self.first_timestamp_ms {
            Some(first) => self.last_timestamp_ms.saturating_sub(first) as f64 / 1000.0,
            None => 0.0,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ProcessorState {
        ProcessorState::from_fill(self.buffer.len(), self.config.buffer.window_size)
    }

    /// Number of buffered samples.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Vertical samples currently buffered, oldest first.
    pub fn vertical_samples(&self) -> Vec<f64> {
        self.buffer.vertical().collect()
    }

    /// Sampling rate in use, after clamping.
    pub fn sampling_rate_hz(&self) -> f64 {
        self.sampling_rate_hz
    }

    /// Emitted metrics, oldest first, at most `history_capacity`.
    pub fn history(&self) -> &[WaveMetric] {
        &self.history
    }

    pub fn current_height(&self) -> Option<f64> {
        self.smoothed_height
    }

    pub fn current_period(&self) -> Option<f64> {
        self.smoothed_period
    }

    pub fn current_direction(&self) -> Option<f64> {
        self.current_direction
    }

    /// Mean zero-crossing period of the last cycle's accepted windows.
    ///
    /// Computed every cycle but deliberately not blended into the reported
    /// period. `NaN` when no window had two upward crossings.
    pub fn last_zero_crossing_period(&self) -> f64 {
        self.last_zero_crossing_period
    }

    /// Windows that passed the RMS gate in the last cycle.
    pub fn accepted_windows(&self) -> usize {
        self.accepted_windows
    }

    pub fn config(&self) -> &WaveConfig {
        &self.config
    }
}

impl Default for WaveProcessor {
    fn default() -> Self {
        Self::build(WaveConfig::default(), SpectralAnalyzer::default())
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn exponential(previous: Option<f64>, value: f64, alpha: f64) -> f64 {
    match previous {
        Some(p) => alpha * value + (1.0 - alpha) * p,
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    const RATE: f64 = 50.0;

    fn feed_sine(processor: &mut WaveProcessor, count: usize, freq: f64, amplitude: f64) {
        for i in 0..count {
            let t = i as f64 / RATE;
            let v = amplitude * (2.0 * PI * freq * t).sin();
            processor.add_sample(&SensorSample::vertical((i * 20) as u64, v, RATE));
        }
    }

    #[test]
    fn test_state_transitions() {
        let mut processor = WaveProcessor::default();
        assert_eq!(processor.state(), ProcessorState::Idle);
        feed_sine(&mut processor, 10, 0.1, 1.0);
        assert_eq!(processor.state(), ProcessorState::Accumulating);
        feed_sine(&mut processor, 1024, 0.1, 1.0);
        assert_eq!(processor.state(), ProcessorState::Ready);
        processor.clear();
        assert_eq!(processor.state(), ProcessorState::Idle);
    }

    #[test]
    fn test_no_result_when_accumulating() {
        let mut processor = WaveProcessor::default();
        feed_sine(&mut processor, 1023, 0.1, 4.9);
        assert!(processor.process_cycle(None).is_none());
        assert!(processor.history().is_empty());
    }

    #[test]
    fn test_still_buffer_is_rejected() {
        let mut processor = WaveProcessor::default();
        for i in 0..2048u64 {
            processor.add_sample(&SensorSample::vertical(i * 20, 0.0, RATE));
        }
        assert!(processor.process_cycle(None).is_none());
        assert_eq!(processor.accepted_windows(), 0);
    }

    #[test]
    fn test_clipped_buffer_is_rejected() {
        let mut processor = WaveProcessor::default();
        for i in 0..2048u64 {
            let v = if i % 2 == 0 { 50.0 } else { -50.0 };
            processor.add_sample(&SensorSample::vertical(i * 20, v, RATE));
        }
        assert!(processor.process_cycle(None).is_none());
    }

    #[test]
    fn test_swell_produces_metric() {
        let mut processor = WaveProcessor::default();
        feed_sine(&mut processor, 2048, 0.1, 4.905);
        let metric = processor.process_cycle(None).expect("metric");
        assert!(metric.height > 0.0 && metric.height.is_finite());
        assert!(metric.period > 7.0 && metric.period < 13.0, "period {}", metric.period);
        assert_eq!(processor.accepted_windows(), 3);
        assert_abs_diff_eq!(metric.elapsed_time, 2047.0 * 0.02, epsilon = 1e-9);
        assert_eq!(processor.history().len(), 1);
        assert_eq!(processor.current_height(), Some(metric.height));
    }

    #[test]
    fn test_early_nan_only_rejects_its_window() {
        let mut processor = WaveProcessor::default();
        for i in 0..2048 {
            let t = i as f64 / RATE;
            let v = if i == 100 {
                f64::NAN
            } else {
                4.905 * (2.0 * PI * 0.1 * t).sin()
            };
            processor.add_sample(&SensorSample::vertical((i * 20) as u64, v, RATE));
        }
        let metric = processor.process_cycle(None).expect("clean windows still count");
        assert_eq!(processor.accepted_windows(), 2);
        assert!(metric.height.is_finite() && metric.height > 0.0);
        assert!(metric.period.is_finite());
    }

    #[test]
    fn test_zero_crossing_tracked_not_merged() {
        let mut processor = WaveProcessor::default();
        assert!(processor.last_zero_crossing_period().is_nan());
        // 0.4 Hz gives several crossings per 20 s window.
        feed_sine(&mut processor, 2048, 0.4, 2.0);
        let metric = processor.process_cycle(None).expect("metric");
        let zc = processor.last_zero_crossing_period();
        assert!((zc - 2.5).abs() < 0.2, "zero-crossing period {zc}");
        assert_ne!(metric.period, zc);
    }

    #[test]
    fn test_direction_sentinel_and_gyro_blend() {
        let mut processor = WaveProcessor::default();
        feed_sine(&mut processor, 1500, 0.1, 4.905);
        let without = processor.process_cycle(None).expect("metric");
        assert_eq!(without.direction, 0.0);

        let mut processor = WaveProcessor::default();
        feed_sine(&mut processor, 1500, 0.1, 4.905);
        let with = processor.process_cycle(Some(90.0)).expect("metric");
        assert_abs_diff_eq!(with.direction, 45.0, epsilon = 1e-9);
        assert_eq!(processor.current_direction(), Some(with.direction));
    }

    #[test]
    fn test_direction_smoothing_and_snap() {
        let mut processor = WaveProcessor::default();
        assert_eq!(processor.update_direction(100.0, None), 100.0);
        // Small change: moves 30% of the way.
        assert_abs_diff_eq!(processor.update_direction(110.0, None), 103.0, epsilon = 1e-9);
        // Large change: snaps.
        assert_eq!(processor.update_direction(200.0, None), 200.0);
        // Small change across north.
        processor.update_direction(350.0, None);
        assert_abs_diff_eq!(processor.update_direction(10.0, None), 356.0, epsilon = 1e-9);
    }

    #[test]
    fn test_height_is_smoothed() {
        let mut processor = WaveProcessor::default();
        feed_sine(&mut processor, 2048, 0.1, 4.905);
        let first = processor.process_cycle(None).unwrap().height;

        let mut bigger = WaveProcessor::default();
        feed_sine(&mut bigger, 2048, 0.1, 9.81);
        let raw_big = bigger.process_cycle(None).unwrap().height;

        processor.clear();
        processor.smoothed_height = Some(first);
        feed_sine(&mut processor, 2048, 0.1, 9.81);
        let second = processor.process_cycle(None).unwrap().height;
        assert_abs_diff_eq!(second, 0.3 * raw_big + 0.7 * first, epsilon = 1e-9);
    }

    #[test]
    fn test_history_is_capped() {
        let mut processor = WaveProcessor::default();
        feed_sine(&mut processor, 1024, 0.1, 4.905);
        for _ in 0..60 {
            processor.process_cycle(None).unwrap();
        }
        assert_eq!(processor.history().len(), 50);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut processor = WaveProcessor::default();
        feed_sine(&mut processor, 2048, 0.1, 4.905);
        processor.process_cycle(Some(10.0)).unwrap();
        processor.clear();
        assert!(processor.is_empty());
        assert!(processor.history().is_empty());
        assert_eq!(processor.current_height(), None);
        assert_eq!(processor.current_period(), None);
        assert_eq!(processor.current_direction(), None);
        assert_eq!(processor.sampling_rate_hz(), RATE);
    }

    #[test]
    fn test_rate_is_clamped() {
        let mut processor = WaveProcessor::default();
        processor.add_sample(&SensorSample::vertical(0, 0.0, 5000.0));
        assert_eq!(processor.sampling_rate_hz(), 200.0);
        processor.add_sample(&SensorSample::vertical(1, 0.0, 0.0));
        assert_eq!(processor.sampling_rate_hz(), 50.0);
    }

    #[test]
    fn test_new_validates_config() {
        let mut config = WaveConfig::default();
        config.buffer.window_size = 1000;
        assert!(WaveProcessor::new(config).is_err());
        assert!(WaveProcessor::new(WaveConfig::default()).is_ok());
    }
}
