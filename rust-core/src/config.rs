//! # Configuration
//!
//! Tunable parameters for every pipeline stage, loadable from a TOML file.
//! Every section falls back to its defaults when omitted, so a config file
//! only needs to name the values it changes:
//!
//! ```toml
//! [gating]
//! min_rms = 0.02
//!
//! [smoothing]
//! height_alpha = 0.5
//! ```
//!
//! The defaults are tuned for a phone held on deck measuring swell-scale
//! motion at around 50 Hz.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, WaveError};

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    pub buffer: BufferConfig,
    pub filters: FilterConfig,
    pub spectral: SpectralConfig,
    pub gating: GatingConfig,
    pub smoothing: SmoothingConfig,
    pub sampling: SamplingConfig,
    pub fusion: FusionConfig,
    pub forecast: ForecastConfig,
}

/// Rolling buffer and window segmentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Maximum samples retained per axis. Oldest are evicted first.
    pub capacity: usize,
    /// Samples per analysis window. Must be a power of two.
    pub window_size: usize,
    /// Offset between consecutive windows (window_size / 2 = 50% overlap).
    pub stride: usize,
    /// Maximum wave metrics kept in history.
    pub history_capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: 2048,
            window_size: 1024,
            stride: 512,
            history_capacity: 50,
        }
    }
}

/// Time-domain filter window sizes, in samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Rolling mean window removed from the whole vertical buffer.
    pub high_pass_window: usize,
    /// Spike suppression window applied per analysis window.
    pub median_window: usize,
    /// Smoothing window applied after the median filter.
    pub moving_average_window: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            high_pass_window: 51,
            median_window: 5,
            moving_average_window: 5,
        }
    }
}

/// Frequency-domain analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectralConfig {
    /// Lower edge of the swell band used for moments, Hz.
    pub band_low_hz: f64,
    /// Upper edge of the swell band used for moments, Hz.
    pub band_high_hz: f64,
    /// Horizontal samples required for a cross-spectrum direction.
    pub direction_samples: usize,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            band_low_hz: 0.05,
            band_high_hz: 0.5,
            direction_samples: 2048,
        }
    }
}

/// RMS gate for rejecting degenerate windows (stillness or clipping).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatingConfig {
    pub min_rms: f64,
    pub max_rms: f64,
}

impl Default for GatingConfig {
    fn default() -> Self {
        Self {
            min_rms: 0.01,
            max_rms: 10.0,
        }
    }
}

/// Output smoothing against the previous cycle.
///
/// Each alpha is the weight given to the new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub height_alpha: f64,
    pub period_alpha: f64,
    pub direction_alpha: f64,
    /// Direction jumps at or above this many degrees replace the previous value outright.
    pub direction_snap_deg: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            height_alpha: 0.3,
            period_alpha: 0.3,
            direction_alpha: 0.3,
            direction_snap_deg: 45.0,
        }
    }
}

/// Plausible sampling rate range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Rate assumed before any sample has arrived.
    pub default_rate_hz: f64,
    pub min_rate_hz: f64,
    pub max_rate_hz: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            default_rate_hz: 50.0,
            min_rate_hz: 5.0,
            max_rate_hz: 200.0,
        }
    }
}

impl SamplingConfig {
    /// Clamp a reported rate into the plausible range.
    ///
    /// Non-finite or non-positive rates fall back to the default rate.
    pub fn clamp_rate(&self, rate_hz: f64) -> f64 {
        if !rate_hz.is_finite() || rate_hz <= 0.0 {
            return self.default_rate_hz;
        }
        rate_hz.clamp(self.min_rate_hz, self.max_rate_hz)
    }
}

/// Gravity removal and heading fusion time constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Gravity low-pass time constant in seconds.
    pub gravity_time_constant_s: f64,
    pub gravity_alpha_min: f64,
    pub gravity_alpha_max: f64,
    /// Complementary heading filter time constant in seconds.
    pub heading_time_constant_s: f64,
    pub heading_alpha_min: f64,
    pub heading_alpha_max: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            gravity_time_constant_s: 1.0,
            gravity_alpha_min: 0.5,
            gravity_alpha_max: 0.99,
            heading_time_constant_s: 3.0,
            heading_alpha_min: 0.8,
            heading_alpha_max: 0.99,
        }
    }
}

/// Big-wave trend forecasting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Number of most recent heights considered.
    pub window: usize,
    /// Slope (m per cycle) that saturates the trend term.
    pub slope_scale: f64,
    /// Z-score that saturates the recency term.
    pub z_scale: f64,
    /// Height in metres that saturates the magnitude term.
    pub magnitude_scale_m: f64,
    pub trend_weight: f64,
    pub recency_weight: f64,
    pub magnitude_weight: f64,
    /// Confidence above which a big wave is predicted.
    pub big_wave_threshold: f64,
    /// Weight of the newest confidence in the smoothed confidence.
    pub confidence_alpha: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            window: 6,
            slope_scale: 0.2,
            z_scale: 2.0,
            magnitude_scale_m: 3.0,
            trend_weight: 0.4,
            recency_weight: 0.3,
            magnitude_weight: 0.3,
            big_wave_threshold: 0.75,
            confidence_alpha: 0.5,
        }
    }
}

impl WaveConfig {
    /// Load configuration from a TOML file.
    ///
    /// A missing file yields the defaults. A file that exists but does not
    /// parse or validate is an error.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        let config = Self::from_toml_str(&contents)?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: WaveConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Render the configuration as pretty TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// Check cross-field invariants.
    pub fn validate(&self) -> Result<()> {
        let b = &self.buffer;
        if !b.window_size.is_power_of_two() {
            return invalid(format!("window_size {} is not a power of two", b.window_size));
        }
        if b.stride == 0 {
            return invalid("stride must be positive".into());
        }
        if b.capacity < b.window_size {
            return invalid(format!(
                "capacity {} is smaller than window_size {}",
                b.capacity, b.window_size
            ));
        }
        if b.history_capacity == 0 {
            return invalid("history_capacity must be positive".into());
        }
        let s = &self.spectral;
        if !s.direction_samples.is_power_of_two() || s.direction_samples > b.capacity {
            return invalid(format!(
                "direction_samples {} must be a power of two no larger than capacity",
                s.direction_samples
            ));
        }
        if !(s.band_low_hz >= 0.0 && s.band_low_hz < s.band_high_hz) {
            return invalid("spectral band must satisfy 0 <= low < high".into());
        }
        if !(self.gating.min_rms >= 0.0 && self.gating.min_rms < self.gating.max_rms) {
            return invalid("rms gate must satisfy 0 <= min < max".into());
        }
        let r = &self.sampling;
        if !(r.min_rate_hz > 0.0 && r.min_rate_hz <= r.default_rate_hz && r.default_rate_hz <= r.max_rate_hz) {
            return invalid("sampling rates must satisfy 0 < min <= default <= max".into());
        }
        let sm = &self.smoothing;
        for (name, alpha) in [
            ("height_alpha", sm.height_alpha),
            ("period_alpha", sm.period_alpha),
            ("direction_alpha", sm.direction_alpha),
            ("confidence_alpha", self.forecast.confidence_alpha),
        ] {
            if !(alpha > 0.0 && alpha <= 1.0) {
                return invalid(format!("{name} must be in (0, 1], got {alpha}"));
            }
        }
        let f = &self.fusion;
        if f.gravity_time_constant_s <= 0.0 || f.heading_time_constant_s <= 0.0 {
            return invalid("fusion time constants must be positive".into());
        }
        if f.gravity_alpha_min > f.gravity_alpha_max || f.heading_alpha_min > f.heading_alpha_max {
            return invalid("fusion alpha clamps are inverted".into());
        }
        if self.forecast.window < 2 {
            return invalid("forecast window must hold at least two heights".into());
        }
        Ok(())
    }
}

fn invalid(reason: String) -> Result<()> {
    Err(WaveError::InvalidConfig { reason })
}
