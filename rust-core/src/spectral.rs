//! Spectral analysis: power spectral density, moments, wave parameters and
//! cross-spectrum direction.
//!
//! Moments are integrated over the swell band only (0.05–0.5 Hz by
//! default). That keeps DC drift left over from gravity removal and
//! high-frequency handling noise out of the height estimate.

use tracing::trace;

use crate::config::SpectralConfig;
use crate::error::{Result, WaveError};
use crate::fft;
use crate::filters::hanning_window;
use crate::fusion::normalize_degrees;
use crate::types::{SpectralMoments, SpectrumSample, WaveEstimate};

/// Frequency-domain analysis stage.
#[derive(Debug, Clone)]
pub struct SpectralAnalyzer {
    band_low_hz: f64,
    band_high_hz: f64,
    direction_samples: usize,
}

impl Default for SpectralAnalyzer {
    fn default() -> Self {
        Self {
            band_low_hz: 0.05,
            band_high_hz: 0.5,
            direction_samples: 2048,
        }
    }
}

impl SpectralAnalyzer {
    /// Create an analyzer from configuration.
    ///
    /// `direction_samples` must be a power of two.
    pub fn new(config: &SpectralConfig) -> Result<Self> {
        if !config.direction_samples.is_power_of_two() {
            return Err(WaveError::InvalidLength {
                n: config.direction_samples,
            });
        }
        Ok(Self {
            band_low_hz: config.band_low_hz,
            band_high_hz: config.band_high_hz,
            direction_samples: config.direction_samples,
        })
    }

    /// Horizontal samples needed before [`Self::direction`] leaves its sentinel.
    pub fn direction_samples(&self) -> usize {
        self.direction_samples
    }

    /// One-sided power spectral density from an interleaved FFT output of length `n`.
    ///
    /// `power[i] = (re² + im²) / (n·Δt)` with Δt = 1/sampling_rate, for the
    /// first n/2 bins. Missing bins in a short input count as zero.
    pub fn density(fft_output: &[f64], n: usize, sampling_rate_hz: f64) -> SpectrumSample {
        if n == 0 {
            return SpectrumSample::default();
        }
        let dt = 1.0 / sampling_rate_hz;
        let norm = n as f64 * dt;
        let bins = (0..n / 2)
            .map(|i| {
                let re = fft_output.get(2 * i).copied().unwrap_or(0.0);
                let im = fft_output.get(2 * i + 1).copied().unwrap_or(0.0);
                let freq = i as f64 * sampling_rate_hz / n as f64;
                (freq, (re * re + im * im) / norm)
            })
            .collect();
        SpectrumSample::new(bins)
    }

    /// Spectral moments over the swell band.
    ///
    /// With `is_accel_spectrum` each density is divided by ω⁴ (ω = 2πf) to
    /// turn an acceleration spectrum into a displacement spectrum first.
    pub fn moments(&self, spectrum: &SpectrumSample, sampling_rate_hz: f64, is_accel_spectrum: bool) -> SpectralMoments {
        if spectrum.is_empty() {
            return SpectralMoments::default();
        }
        let df = sampling_rate_hz / (2 * spectrum.len()) as f64;

        let mut m = SpectralMoments::default();
        for &(f, power) in &spectrum.bins {
            if f < self.band_low_hz || f > self.band_high_hz || !power.is_finite() {
                continue;
            }
            let s = if is_accel_spectrum {
                if f <= 0.0 {
                    continue;
                }
                let omega = 2.0 * std::f64::consts::PI * f;
                power / omega.powi(4)
            } else {
                power
            };
            m.m0 += s * df;
            m.m1 += s * f * df;
            m.m2 += s * f * f * df;
        }
        m
    }

    /// Wave height and periods from moments.
    ///
    /// Degenerate moments give zero periods, never NaN or infinity.
    pub fn metrics(moments: SpectralMoments) -> WaveEstimate {
        let m0 = moments.m0.max(0.0);
        let height = 4.0 * m0.sqrt();
        let mean_period = if moments.m1 > 0.0 { m0 / moments.m1 } else { 0.0 };
        let zero_crossing_period = if moments.m2 != 0.0 {
            (m0 / moments.m2).sqrt()
        } else {
            0.0
        };
        WaveEstimate {
            height,
            mean_period: finite_or_zero(mean_period),
            zero_crossing_period: finite_or_zero(zero_crossing_period),
        }
    }

    /// Wave propagation direction from horizontal acceleration, degrees in [0, 360).
    ///
    /// Uses the most recent `direction_samples` of each axis. The relative
    /// phase of Y against X at the dominant X bin gives the direction.
    ///
    /// Returns exactly 0.0 when either axis holds fewer samples than needed.
    /// That sentinel cannot be told apart from a genuine northward reading.
    pub fn direction(&self, accel_x: &[f64], accel_y: &[f64]) -> f64 {
        let n = self.direction_samples;
        if accel_x.len() < n || accel_y.len() < n {
            return 0.0;
        }

        let x = hanning_window(&accel_x[accel_x.len() - n..]);
        let y = hanning_window(&accel_y[accel_y.len() - n..]);
        let (Ok(sx), Ok(sy)) = (fft::forward_complex(&x, n), fft::forward_complex(&y, n)) else {
            return 0.0;
        };

        // DC carries no phase information.
        let Some(peak) = (1..n / 2).max_by(|&a, &b| sx[a].norm_sqr().total_cmp(&sx[b].norm_sqr())) else {
            return 0.0;
        };

        let (a, b) = (sx[peak], sy[peak]);
        let cross_im = b.im * a.re - b.re * a.im;
        let cross_re = b.re * a.re + b.im * a.im;
        let direction = cross_im.atan2(cross_re).to_degrees();
        if !direction.is_finite() {
            return 0.0;
        }
        let direction = normalize_degrees(direction);
        trace!(peak, direction, "cross-spectrum direction");
        direction
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}
