//! Swell Wave Estimation Library
//!
//! A streaming estimator that turns phone or buoy IMU readings into ocean
//! wave metrics: significant wave height, mean period and propagation
//! direction, plus a short-horizon big-wave forecast.
//!
//! # Design Philosophy
//!
//! - **Insufficient data is not an error**: cycles without enough samples
//!   yield `None`; the engine never fails on a quiet sea.
//! - **Bounded memory**: fixed-capacity rolling buffers and history.
//! - **Band-limited**: only swell-band energy (0.05–0.5 Hz) counts towards
//!   height, so drift and handling noise stay out.
//! - **Fail-soft numerics**: degenerate spectra give zeros, never NaN.
//!
//! # Example
//!
//! ```
//! use swell_core::{SensorSample, WaveProcessor};
//!
//! let mut processor = WaveProcessor::default();
//! for i in 0..2048u64 {
//!     let t = i as f64 / 50.0;
//!     let accel = 3.0 * (2.0 * std::f64::consts::PI * 0.2 * t).sin();
//!     processor.add_sample(&SensorSample::vertical(i * 20, accel, 50.0));
//! }
//!
//! let metric = processor.process_cycle(None).expect("a full buffer of swell");
//! assert!(metric.height > 0.0);
//! ```

pub mod buffer;
pub mod complex;
pub mod config;
pub mod error;
pub mod fft;
pub mod filters;
pub mod forecast;
pub mod fusion;
pub mod logging;
pub mod processor;
pub mod shared;
pub mod spectral;
pub mod types;
pub mod zero_crossing;


// Re-export commonly used types
pub use config::WaveConfig;
pub use error::{Result, WaveError};
pub use forecast::TrendForecaster;
pub use fusion::{AttitudeProvider, HeadingFusion, SensorFusion, StaticAttitude};
pub use processor::WaveProcessor;
pub use shared::SharedWaveProcessor;
pub use spectral::SpectralAnalyzer;
pub use types::{
    ForecastResult, GyroSample, ProcessorState, RawImuSample, SensorSample, SpectralMoments,
    SpectrumSample, WaveEstimate, WaveMetric,
};
