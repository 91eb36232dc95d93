//! Time-domain period estimate from upward zero crossings.

/// Mean period between upward zero crossings, in seconds.
///
/// An upward crossing is a step where the previous sample is negative and
/// the current one is zero or positive. Returns `NaN` when fewer than two
/// crossings are present or the sampling rate is not positive.
pub fn period(signal: &[f64], sampling_rate_hz: f64) -> f64 {
    if !(sampling_rate_hz > 0.0) {
        return f64::NAN;
    }

    let crossings: Vec<usize> = signal
        .windows(2)
        .enumerate()
        .filter(|(_, w)| w[0] < 0.0 && w[1] >= 0.0)
        .map(|(i, _)| i + 1)
        .collect();

    if crossings.len() < 2 {
        return f64::NAN;
    }

    let intervals = crossings.len() - 1;
    let mean_samples = (crossings[intervals] - crossings[0]) as f64 / intervals as f64;
    mean_samples / sampling_rate_hz
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_sine_period() {
        let rate = 50.0;
        let signal: Vec<f64> = (0..2000)
            .map(|i| (2.0 * PI * 0.25 * i as f64 / rate + 0.3).sin())
            .collect();
        assert_abs_diff_eq!(period(&signal, rate), 4.0, epsilon = 0.05);
    }

    #[test]
    fn test_square_wave_exact() {
        // Period of 10 samples: five negative, five positive.
        let signal: Vec<f64> = (0..60).map(|i| if i % 10 < 5 { -1.0 } else { 1.0 }).collect();
        assert_abs_diff_eq!(period(&signal, 10.0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_counts_as_upward() {
        let signal = [-1.0, 0.0, 1.0, -1.0, 0.0];
        assert_abs_diff_eq!(period(&signal, 1.0), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_insufficient_crossings_is_nan() {
        assert!(period(&[], 50.0).is_nan());
        assert!(period(&[1.0, 2.0, 3.0], 50.0).is_nan());
        assert!(period(&[-1.0, 1.0, 2.0], 50.0).is_nan());
    }

    #[test]
    fn test_bad_rate_is_nan() {
        let signal = [-1.0, 1.0, -1.0, 1.0];
        assert!(period(&signal, 0.0).is_nan());
        assert!(period(&signal, f64::NAN).is_nan());
    }
}
