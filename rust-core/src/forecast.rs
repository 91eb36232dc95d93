//! Big-wave forecasting from recent wave height trends.
//!
//! Confidence combines three terms over the last few heights, each scaled
//! and clamped to [0, 1]:
//! - trend: least-squares slope of height per cycle
//! - recency: z-score of the newest height against the window
//! - magnitude: the newest height itself
//!
//! With fewer heights than the window the confidence is exactly zero.

use crate::config::ForecastConfig;
use crate::types::{ForecastResult, WaveMetric};

/// Least-squares slope of value against index. Zero for fewer than two points.
pub fn slope(data: &[f64]) -> f64 {
    let n = data.len();
    if n < 2 {
        return 0.0;
    }
    let nf = n as f64;
    let mean_x = (nf - 1.0) / 2.0;
    let mean_y = data.iter().sum::<f64>() / nf;

    let (mut num, mut den) = (0.0, 0.0);
    for (i, y) in data.iter().enumerate() {
        let dx = i as f64 - mean_x;
        num += dx * (y - mean_y);
        den += dx * dx;
    }
    num / den
}

/// One-step linear extrapolation of the series.
///
/// `None` for fewer than two points.
pub fn forecast_next(data: &[f64]) -> Option<f64> {
    if data.len() < 2 {
        return None;
    }
    let n = data.len() as f64;
    let b = slope(data);
    let mean_y = data.iter().sum::<f64>() / n;
    let intercept = mean_y - b * (n - 1.0) / 2.0;
    Some(intercept + b * n)
}

/// Trend forecaster over a wave metric history.
///
/// Reads history only; its sole state is the smoothed confidence.
#[derive(Debug, Clone)]
pub struct TrendForecaster {
    config: ForecastConfig,
    smoothed_confidence: Option<f64>,
}

impl Default for TrendForecaster {
    fn default() -> Self {
        Self::new(ForecastConfig::default())
    }
}

impl TrendForecaster {
    pub fn new(config: ForecastConfig) -> Self {
        Self {
            config,
            smoothed_confidence: None,
        }
    }

    /// Big-wave confidence in [0, 1] from the most recent heights.
    pub fn confidence(&self, history: &[WaveMetric]) -> f64 {
        let window = self.config.window;
        if history.len() < window {
            return 0.0;
        }
        let heights = recent_heights(history, window);
        let Some(&last) = heights.last() else {
            return 0.0;
        };

        let trend = unit(slope(&heights) / self.config.slope_scale);
        let recency = unit(z_score(&heights, last) / self.config.z_scale);
        let magnitude = unit(last / self.config.magnitude_scale_m);

        unit(
            self.config.trend_weight * trend
                + self.config.recency_weight * recency
                + self.config.magnitude_weight * magnitude,
        )
    }

    /// Whether the confidence crosses the big-wave threshold.
    pub fn predict_big_wave(&self, history: &[WaveMetric]) -> bool {
        self.confidence(history) > self.config.big_wave_threshold
    }

    /// Full forecast, updating the smoothed confidence.
    pub fn evaluate(&mut self, history: &[WaveMetric]) -> ForecastResult {
        let confidence = self.confidence(history);
        let heights = recent_heights(history, self.config.window);
        let alpha = self.config.confidence_alpha;
        let smoothed = match self.smoothed_confidence {
            Some(previous) => alpha * confidence + (1.0 - alpha) * previous,
            None => confidence,
        };
        self.smoothed_confidence = Some(smoothed);

        ForecastResult {
            confidence,
            predicted_next_height: forecast_next(&heights),
            big_wave: confidence > self.config.big_wave_threshold,
            smoothed_confidence: smoothed,
        }
    }

    pub fn smoothed_confidence(&self) -> Option<f64> {
        self.smoothed_confidence
    }

    pub fn reset(&mut self) {
        self.smoothed_confidence = None;
    }
}

fn recent_heights(history: &[WaveMetric], window: usize) -> Vec<f64> {
    let start = history.len().saturating_sub(window);
    history[start..].iter().map(|m| m.height).collect()
}

/// Z-score of `value` against the population statistics of `data`. Zero for flat data.
fn z_score(data: &[f64], value: f64) -> f64 {
    let n = data.len() as f64;
    let mean = data.iter().sum::<f64>() / n;
    let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();
    if std > 0.0 {
        (value - mean) / std
    } else {
        0.0
    }
}

fn unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}
