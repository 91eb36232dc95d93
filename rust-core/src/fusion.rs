//! Sensor fusion: gravity separation and heading estimation.
//!
//! This module turns raw device readings into the earth-frame samples the
//! wave processor consumes:
//! - Gravity is tracked per axis with an incremental low-pass filter whose
//!   coefficient follows from a time constant and the sample interval.
//! - Linear acceleration (raw minus gravity) is rotated into the earth frame
//!   using attitude from an injected [`AttitudeProvider`], or left in the
//!   device frame when no attitude is available.
//! - Heading is a complementary filter: integrated gyroscope yaw for the
//!   short term, magnetometer heading for the long term.
//!
//! All updates are O(1) per sample.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::{FusionConfig, SamplingConfig};
use crate::types::{GyroSample, RawImuSample, SensorSample};

/// Row-major 3x3 rotation matrix from device frame to earth frame
/// (X east, Y north, Z up).
pub type RotationMatrix = [f64; 9];

/// Callback receiving each new attitude from a provider.
pub type AttitudeCallback = Box<dyn Fn(RotationMatrix) + Send + Sync>;

/// Platform attitude source, injected into [`SensorFusion`].
pub trait AttitudeProvider: Send {
    /// Whether the platform can deliver attitude at all.
    fn is_available(&self) -> bool;

    /// Start delivering attitude updates to `callback`.
    fn subscribe(&mut self, callback: AttitudeCallback);

    /// Stop delivering updates.
    fn unsubscribe(&mut self);
}

/// Fixed attitude, for rigid mounts and tests.
pub struct StaticAttitude {
    matrix: RotationMatrix,
    callback: Option<AttitudeCallback>,
}

impl StaticAttitude {
    pub fn new(matrix: RotationMatrix) -> Self {
        Self {
            matrix,
            callback: None,
        }
    }

    /// Device frame already aligned with the earth frame.
    pub fn identity() -> Self {
        Self::new([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0])
    }

    /// Replace the attitude and push it to the subscriber, if any.
    pub fn set(&mut self, matrix: RotationMatrix) {
        self.matrix = matrix;
        if let Some(callback) = &self.callback {
            callback(matrix);
        }
    }
}

impl AttitudeProvider for StaticAttitude {
    fn is_available(&self) -> bool {
        true
    }

    fn subscribe(&mut self, callback: AttitudeCallback) {
        callback(self.matrix);
        self.callback = Some(callback);
    }

    fn unsubscribe(&mut self) {
        self.callback = None;
    }
}

/// Per-axis gravity low-pass filter.
///
/// `gravity = α·gravity + (1−α)·raw` with α = T/(T+Δt), clamped.
#[derive(Debug, Clone)]
pub struct GravityFilter {
    gravity: Option<[f64; 3]>,
    time_constant_s: f64,
    alpha_min: f64,
    alpha_max: f64,
    sample_count: u64,
}

impl GravityFilter {
    pub fn new(config: &FusionConfig) -> Self {
        Self {
            gravity: None,
            time_constant_s: config.gravity_time_constant_s,
            alpha_min: config.gravity_alpha_min,
            alpha_max: config.gravity_alpha_max,
            sample_count: 0,
        }
    }

    /// Filter coefficient for a sample interval.
    pub fn alpha(&self, dt_s: f64) -> f64 {
        (self.time_constant_s / (self.time_constant_s + dt_s)).clamp(self.alpha_min, self.alpha_max)
    }

    /// Update the gravity estimate and return linear acceleration (raw − gravity).
    ///
    /// The first sample seeds the estimate, so its linear acceleration is zero.
    pub fn update(&mut self, accel: [f64; 3], dt_s: f64) -> [f64; 3] {
        let alpha = self.alpha(dt_s);
        let gravity = match self.gravity {
            Some(g) => [
                alpha * g[0] + (1.0 - alpha) * accel[0],
                alpha * g[1] + (1.0 - alpha) * accel[1],
                alpha * g[2] + (1.0 - alpha) * accel[2],
            ],
            None => accel,
        };
        self.gravity = Some(gravity);
        self.sample_count += 1;

        [
            accel[0] - gravity[0],
            accel[1] - gravity[1],
            accel[2] - gravity[2],
        ]
    }

    /// Current gravity estimate, if any sample has been seen.
    pub fn gravity(&self) -> Option<[f64; 3]> {
        self.gravity
    }

    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    pub fn reset(&mut self) {
        self.gravity = None;
        self.sample_count = 0;
    }
}

/// Raw device readings to earth-frame linear acceleration.
pub struct SensorFusion {
    gravity: GravityFilter,
    sampling: SamplingConfig,
    attitude: Arc<Mutex<Option<RotationMatrix>>>,
    provider: Option<Box<dyn AttitudeProvider>>,
}

impl SensorFusion {
    pub fn new(fusion: &FusionConfig, sampling: &SamplingConfig) -> Self {
        Self {
            gravity: GravityFilter::new(fusion),
            sampling: sampling.clone(),
            attitude: Arc::new(Mutex::new(None)),
            provider: None,
        }
    }

    /// Subscribe to an attitude provider. Returns false if it is unavailable.
    ///
    /// A previously attached provider is detached first.
    pub fn attach(&mut self, mut provider: Box<dyn AttitudeProvider>) -> bool {
        self.detach();
        if !provider.is_available() {
            warn!("attitude provider unavailable, using device-frame acceleration");
            return false;
        }
        let slot = Arc::clone(&self.attitude);
        provider.subscribe(Box::new(move |matrix| {
            *slot.lock() = Some(matrix);
        }));
        self.provider = Some(provider);
        debug!("attitude provider attached");
        true
    }

    /// Unsubscribe from the current provider and forget the last attitude.
    pub fn detach(&mut self) {
        if let Some(mut provider) = self.provider.take() {
            provider.unsubscribe();
        }
        *self.attitude.lock() = None;
    }

    /// Whether an attitude is currently available for rotation.
    pub fn has_attitude(&self) -> bool {
        self.attitude.lock().is_some()
    }

    pub fn gravity(&self) -> &GravityFilter {
        &self.gravity
    }

    /// Remove gravity and rotate into the earth frame.
    pub fn process(&mut self, raw: &RawImuSample) -> SensorSample {
        let rate = self.sampling.clamp_rate(raw.sampling_rate_hz);
        let linear = self.gravity.update(raw.accel, 1.0 / rate);
        let earth = match *self.attitude.lock() {
            Some(matrix) => rotate(&matrix, linear),
            None => linear,
        };
        SensorSample::new(raw.timestamp_ms, earth[2], earth[0], earth[1], rate)
    }

    pub fn reset(&mut self) {
        self.gravity.reset();
    }
}

impl Drop for SensorFusion {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Complementary heading filter.
#[derive(Debug, Clone)]
pub struct HeadingFusion {
    time_constant_s: f64,
    alpha_min: f64,
    alpha_max: f64,
    heading_deg: Option<f64>,
    last_timestamp_ms: u64,
}

impl HeadingFusion {
    pub fn new(config: &FusionConfig) -> Self {
        Self {
            time_constant_s: config.heading_time_constant_s,
            alpha_min: config.heading_alpha_min,
            alpha_max: config.heading_alpha_max,
            heading_deg: None,
            last_timestamp_ms: 0,
        }
    }

    /// Gyroscope weight for a sample interval.
    pub fn alpha(&self, dt_s: f64) -> f64 {
        (self.time_constant_s / (self.time_constant_s + dt_s)).clamp(self.alpha_min, self.alpha_max)
    }

    /// Fold one gyroscope sample into the heading and return it, degrees in [0, 360).
    ///
    /// The first sample adopts the magnetometer heading. After that the
    /// integrated gyro heading is pulled towards the magnetometer by
    /// (1 − α) along the shorter arc, which equals the plain weighted
    /// average whenever the two headings are less than 180° apart.
    pub fn update(&mut self, sample: &GyroSample) -> f64 {
        let mag = normalize_degrees(sample.magnetometer_heading_deg);

        let heading = match self.heading_deg {
            None => mag,
            Some(previous) => {
                let dt = sample.timestamp_ms.saturating_sub(self.last_timestamp_ms) as f64 / 1000.0;
                let integrated = previous + sample.yaw_rate_rad_s.to_degrees() * dt;
                let alpha = self.alpha(dt);
                normalize_degrees(integrated + (1.0 - alpha) * angular_difference(mag, integrated))
            }
        };

        self.heading_deg = Some(heading);
        self.last_timestamp_ms = sample.timestamp_ms;
        heading
    }

    /// Current filtered heading, once a sample has been seen.
    pub fn heading(&self) -> Option<f64> {
        self.heading_deg
    }

    pub fn reset(&mut self) {
        self.heading_deg = None;
        self.last_timestamp_ms = 0;
    }
}

/// Multiply a row-major rotation matrix by a vector.
pub fn rotate(matrix: &RotationMatrix, v: [f64; 3]) -> [f64; 3] {
    [
        matrix[0] * v[0] + matrix[1] * v[1] + matrix[2] * v[2],
        matrix[3] * v[0] + matrix[4] * v[1] + matrix[5] * v[2],
        matrix[6] * v[0] + matrix[7] * v[1] + matrix[8] * v[2],
    ]
}

/// Wrap an angle into [0, 360) degrees.
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Signed shortest rotation from `from` to `to`, degrees in (−180, 180].
pub fn angular_difference(to: f64, from: f64) -> f64 {
    let d = normalize_degrees(to - from);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

/// Midpoint of two headings along the shorter arc, degrees in [0, 360).
///
/// Same as the arithmetic mean when the headings are less than 180° apart.
pub fn circular_mean(a: f64, b: f64) -> f64 {
    normalize_degrees(b + angular_difference(a, b) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn fusion() -> SensorFusion {
        SensorFusion::new(&FusionConfig::default(), &SamplingConfig::default())
    }

    #[test]
    fn test_gravity_alpha_from_time_constant() {
        let filter = GravityFilter::new(&FusionConfig::default());
        // 1.0 / (1.0 + 0.02)
        assert_abs_diff_eq!(filter.alpha(0.02), 0.980392156862745, epsilon = 1e-12);
        assert_eq!(filter.alpha(0.0), 0.99);
        assert_eq!(filter.alpha(5.0), 0.5);
    }

    #[test]
    fn test_gravity_first_sample_seeds() {
        let mut filter = GravityFilter::new(&FusionConfig::default());
        let linear = filter.update([0.1, 0.2, 9.81], 0.02);
        assert_eq!(linear, [0.0, 0.0, 0.0]);
        assert_eq!(filter.gravity(), Some([0.1, 0.2, 9.81]));
        assert_eq!(filter.sample_count(), 1);
    }

    #[test]
    fn test_gravity_converges_after_rotation() {
        let mut filter = GravityFilter::new(&FusionConfig::default());
        filter.update([0.0, 0.0, 9.81], 0.02);
        // Device turned on its side; about 10 time constants at 50 Hz.
        for _ in 0..500 {
            filter.update([9.81, 0.0, 0.0], 0.02);
        }
        let g = filter.gravity().unwrap();
        assert_abs_diff_eq!(g[0], 9.81, epsilon = 0.01);
        assert_abs_diff_eq!(g[2], 0.0, epsilon = 0.01);
    }

    #[test]
    fn test_linear_acceleration_passes_fast_motion() {
        let mut filter = GravityFilter::new(&FusionConfig::default());
        for _ in 0..500 {
            filter.update([0.0, 0.0, 9.81], 0.02);
        }
        let linear = filter.update([0.0, 0.0, 10.81], 0.02);
        // One sample moves gravity by only (1 − α) of the step.
        assert!(linear[2] > 0.97, "got {}", linear[2]);
    }

    #[test]
    fn test_process_without_attitude_is_device_frame() {
        let mut fusion = fusion();
        fusion.process(&RawImuSample::new(0, [0.0, 0.0, 9.81], 50.0));
        let s = fusion.process(&RawImuSample::new(20, [1.0, 2.0, 9.81], 50.0));
        assert!(s.horizontal_x > 0.0);
        assert!(s.horizontal_y > s.horizontal_x);
        assert_abs_diff_eq!(s.vertical_accel, 0.0, epsilon = 1e-12);
        assert_eq!(s.sampling_rate_hz, 50.0);
        assert_eq!(s.timestamp_ms, 20);
    }

    #[test]
    fn test_process_rotates_with_attitude() {
        let mut fusion = fusion();
        // Device X axis points up in the earth frame.
        let to_earth = [0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0];
        assert!(fusion.attach(Box::new(StaticAttitude::new(to_earth))));
        assert!(fusion.has_attitude());

        fusion.process(&RawImuSample::new(0, [9.81, 0.0, 0.0], 50.0));
        let s = fusion.process(&RawImuSample::new(20, [10.81, 0.0, 0.0], 50.0));
        assert!(s.vertical_accel > 0.0);
        assert_abs_diff_eq!(s.horizontal_x, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_process_clamps_rate() {
        let mut fusion = fusion();
        let s = fusion.process(&RawImuSample::new(0, [0.0, 0.0, 9.81], 10_000.0));
        assert_eq!(s.sampling_rate_hz, 200.0);
    }

    struct Unavailable;

    impl AttitudeProvider for Unavailable {
        fn is_available(&self) -> bool {
            false
        }
        fn subscribe(&mut self, _callback: AttitudeCallback) {
            panic!("must not subscribe to an unavailable provider");
        }
        fn unsubscribe(&mut self) {}
    }

    #[test]
    fn test_attach_unavailable_provider() {
        let mut fusion = fusion();
        assert!(!fusion.attach(Box::new(Unavailable)));
        assert!(!fusion.has_attitude());
    }

    struct Tracking {
        unsubscribed: Arc<AtomicBool>,
    }

    impl AttitudeProvider for Tracking {
        fn is_available(&self) -> bool {
            true
        }
        fn subscribe(&mut self, callback: AttitudeCallback) {
            callback([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
        }
        fn unsubscribe(&mut self) {
            self.unsubscribed.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_detach_unsubscribes() {
        let flag = Arc::new(AtomicBool::new(false));
        let mut fusion = fusion();
        fusion.attach(Box::new(Tracking {
            unsubscribed: Arc::clone(&flag),
        }));
        assert!(fusion.has_attitude());
        fusion.detach();
        assert!(flag.load(Ordering::SeqCst));
        assert!(!fusion.has_attitude());
    }

    #[test]
    fn test_static_attitude_pushes_updates() {
        let seen = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&seen);
        let mut provider = StaticAttitude::identity();
        provider.subscribe(Box::new(move |m| *slot.lock() = Some(m)));
        assert_eq!(seen.lock().unwrap()[0], 1.0);
        provider.set([0.0; 9]);
        assert_eq!(seen.lock().unwrap()[0], 0.0);
        provider.unsubscribe();
        provider.set([2.0; 9]);
        assert_eq!(seen.lock().unwrap()[0], 0.0);
    }

    #[test]
    fn test_heading_first_sample_uses_magnetometer() {
        let mut heading = HeadingFusion::new(&FusionConfig::default());
        assert_eq!(heading.heading(), None);
        assert_eq!(heading.update(&GyroSample::new(1000, 1.0, 123.0)), 123.0);
        assert_eq!(heading.heading(), Some(123.0));
    }

    #[test]
    fn test_heading_steady_when_sensors_agree() {
        let mut heading = HeadingFusion::new(&FusionConfig::default());
        for i in 0..200 {
            heading.update(&GyroSample::new(i * 20, 0.0, 90.0));
        }
        assert_abs_diff_eq!(heading.heading().unwrap(), 90.0, epsilon = 1e-9);
    }

    #[test]
    fn test_heading_follows_gyro_short_term() {
        let mut heading = HeadingFusion::new(&FusionConfig::default());
        heading.update(&GyroSample::new(0, 0.0, 0.0));
        // 90°/s for 0.1 s with a stale magnetometer.
        let rate = 90f64.to_radians();
        let mut h = 0.0;
        for i in 1..=5 {
            h = heading.update(&GyroSample::new(i * 20, rate, 0.0));
        }
        assert!(h > 8.0 && h < 9.0, "got {h}");
    }

    #[test]
    fn test_heading_wraps_across_north() {
        let mut heading = HeadingFusion::new(&FusionConfig::default());
        heading.update(&GyroSample::new(0, 0.0, 359.0));
        let h = heading.update(&GyroSample::new(20, 0.0, 1.0));
        // Pulled slightly clockwise through north, not towards 180.
        assert!(angular_difference(h, 359.0) > 0.0);
        assert!(angular_difference(h, 359.0) < 0.1);
    }

    #[test]
    fn test_heading_blend_takes_shorter_arc() {
        let mut heading = HeadingFusion::new(&FusionConfig::default());
        heading.update(&GyroSample::new(0, 0.0, 359.5));
        // dt = 1 s clamps α to 0.8: 359.5 + 0.2 · 1.5, where a plain
        // weighted average would land on 287.8.
        let h = heading.update(&GyroSample::new(1000, 0.0, 1.0));
        assert_abs_diff_eq!(h, 359.8, epsilon = 1e-9);

        // Same blend the other way round, ending just past north.
        let mut heading = HeadingFusion::new(&FusionConfig::default());
        heading.update(&GyroSample::new(0, 0.0, 1.0));
        let h = heading.update(&GyroSample::new(1000, 0.0, 359.0));
        assert_abs_diff_eq!(h, 0.6, epsilon = 1e-9);
    }

    #[test]
    fn test_heading_reset() {
        let mut heading = HeadingFusion::new(&FusionConfig::default());
        heading.update(&GyroSample::new(0, 0.0, 45.0));
        heading.reset();
        assert_eq!(heading.heading(), None);
        assert_eq!(heading.update(&GyroSample::new(10, 0.0, 200.0)), 200.0);
    }

    #[test]
    fn test_heading_alpha_clamp() {
        let heading = HeadingFusion::new(&FusionConfig::default());
        assert_eq!(heading.alpha(0.0), 0.99);
        assert_eq!(heading.alpha(10.0), 0.8);
        assert_abs_diff_eq!(heading.alpha(0.02), 3.0 / 3.02, epsilon = 1e-12);
    }

    #[test]
    fn test_angle_helpers() {
        assert_eq!(normalize_degrees(370.0), 10.0);
        assert_eq!(normalize_degrees(-10.0), 350.0);
        assert_eq!(normalize_degrees(360.0), 0.0);
        assert!(normalize_degrees(-1e-20) < 360.0);
        assert_eq!(angular_difference(10.0, 350.0), 20.0);
        assert_eq!(angular_difference(350.0, 10.0), -20.0);
        assert_eq!(circular_mean(10.0, 20.0), 15.0);
        assert_eq!(circular_mean(350.0, 10.0), 0.0);
    }
}
