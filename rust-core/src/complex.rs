//! Complex arithmetic for the transforms.
//!
//! The transforms work on [`num_complex::Complex64`], which supplies the
//! add/sub/mul the butterflies need. This module only adds conversions
//! between complex vectors and the interleaved `re, im, re, im, ...` float
//! layout used at the public FFT boundary.

pub use num_complex::Complex64 as Complex;

/// Unit-magnitude twiddle factor e^(i·angle).
#[inline]
pub fn cis(angle: f64) -> Complex {
    Complex::from_polar(1.0, angle)
}

/// Lift real samples into complex values, zero-padding to `n`.
///
/// Callers guarantee `samples.len() <= n`.
pub fn from_real(samples: &[f64], n: usize) -> Vec<Complex> {
    let mut out: Vec<Complex> = samples.iter().map(|&re| Complex::new(re, 0.0)).collect();
    out.resize(n, Complex::new(0.0, 0.0));
    out
}

/// Flatten complex values into `re, im` pairs.
pub fn interleave(values: &[Complex]) -> Vec<f64> {
    values.iter().flat_map(|c| [c.re, c.im]).collect()
}

/// Rebuild complex values from `re, im` pairs, zero-padding to `n` values.
///
/// A trailing unpaired value is treated as a real part.
pub fn deinterleave(pairs: &[f64], n: usize) -> Vec<Complex> {
    let mut out: Vec<Complex> = pairs
        .chunks(2)
        .map(|c| Complex::new(c[0], c.get(1).copied().unwrap_or(0.0)))
        .collect();
    out.resize(n, Complex::new(0.0, 0.0));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_arithmetic() {
        let a = Complex::new(1.0, 2.0);
        let b = Complex::new(3.0, -1.0);
        assert_eq!(a + b, Complex::new(4.0, 1.0));
        assert_eq!(a - b, Complex::new(-2.0, 3.0));
        // (1 + 2i)(3 - i) = 3 - i + 6i - 2i² = 5 + 5i
        assert_eq!(a * b, Complex::new(5.0, 5.0));
    }

    #[test]
    fn test_cis() {
        let w = cis(std::f64::consts::FRAC_PI_2);
        assert_abs_diff_eq!(w.re, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(w.im, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_from_real_pads() {
        let c = from_real(&[1.0, 2.0], 4);
        assert_eq!(c.len(), 4);
        assert_eq!(c[1], Complex::new(2.0, 0.0));
        assert_eq!(c[3], Complex::new(0.0, 0.0));
    }

    #[test]
    fn test_interleave_layout() {
        let pairs = interleave(&[Complex::new(1.0, -1.0), Complex::new(2.0, 3.0)]);
        assert_eq!(pairs, vec![1.0, -1.0, 2.0, 3.0]);
        let back = deinterleave(&pairs, 2);
        assert_eq!(back, vec![Complex::new(1.0, -1.0), Complex::new(2.0, 3.0)]);
    }

    #[test]
    fn test_deinterleave_odd_tail() {
        let back = deinterleave(&[1.0, 2.0, 5.0], 3);
        assert_eq!(back[1], Complex::new(5.0, 0.0));
        assert_eq!(back[2], Complex::new(0.0, 0.0));
    }
}
