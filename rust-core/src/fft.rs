//! Radix-2 Fast Fourier Transform for real input.
//!
//! Two decimation-in-time Cooley-Tukey implementations are provided:
//! - `Recursive`: splits on even/odd indices and recombines with twiddles.
//! - `Iterative`: bit-reversal permutation followed by in-place butterflies.
//!
//! Both produce the same output to within float rounding. The public entry
//! points use the iterative form.
//!
//! Spectra cross the public boundary as interleaved `re, im` pairs, so a
//! transform of length `n` yields `2 * n` floats. Only power-of-two lengths
//! are supported.

use std::f64::consts::PI;

use crate::complex::{self, cis, Complex};
use crate::error::{Result, WaveError};

/// Transform implementation selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FftAlgorithm {
    /// Recursive even/odd split.
    Recursive,
    /// Bit-reversal permutation plus butterfly passes.
    #[default]
    Iterative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Inverse,
}

impl Direction {
    /// Sign of the twiddle exponent: e^(∓2πik/n).
    fn sign(self) -> f64 {
        match self {
            Direction::Forward => -1.0,
            Direction::Inverse => 1.0,
        }
    }
}

/// Forward transform of real samples, zero-padded to `n`.
///
/// Returns `2 * n` interleaved `re, im` values.
pub fn forward(samples: &[f64], n: usize) -> Result<Vec<f64>> {
    forward_with(samples, n, FftAlgorithm::default())
}

/// Inverse transform of an interleaved spectrum back to `n` real samples, scaled by 1/n.
///
/// A spectrum shorter than `2 * n` values is zero-padded.
pub fn inverse(spectrum: &[f64], n: usize) -> Result<Vec<f64>> {
    inverse_with(spectrum, n, FftAlgorithm::default())
}

/// [`forward`] with an explicit algorithm.
pub fn forward_with(samples: &[f64], n: usize, algorithm: FftAlgorithm) -> Result<Vec<f64>> {
    let spectrum = forward_complex_with(samples, n, algorithm)?;
    Ok(complex::interleave(&spectrum))
}

/// [`inverse`] with an explicit algorithm.
pub fn inverse_with(spectrum: &[f64], n: usize, algorithm: FftAlgorithm) -> Result<Vec<f64>> {
    check_length(n)?;
    if spectrum.len() > 2 * n {
        return Err(WaveError::InputTooLong {
            len: spectrum.len(),
            n: 2 * n,
        });
    }
    let bins = complex::deinterleave(spectrum, n);
    let scale = 1.0 / n as f64;
    let time = transform(bins, Direction::Inverse, algorithm);
    Ok(time.iter().map(|c| c.re * scale).collect())
}

/// Forward transform returning complex bins directly.
pub fn forward_complex(samples: &[f64], n: usize) -> Result<Vec<Complex>> {
    forward_complex_with(samples, n, FftAlgorithm::default())
}

fn forward_complex_with(samples: &[f64], n: usize, algorithm: FftAlgorithm) -> Result<Vec<Complex>> {
    check_length(n)?;
    if samples.len() > n {
        return Err(WaveError::InputTooLong {
            len: samples.len(),
            n,
        });
    }
    Ok(transform(complex::from_real(samples, n), Direction::Forward, algorithm))
}

fn check_length(n: usize) -> Result<()> {
    if n.is_power_of_two() {
        Ok(())
    } else {
        Err(WaveError::InvalidLength { n })
    }
}

fn transform(data: Vec<Complex>, direction: Direction, algorithm: FftAlgorithm) -> Vec<Complex> {
    match algorithm {
        FftAlgorithm::Recursive => recursive(&data, direction.sign()),
        FftAlgorithm::Iterative => {
            let mut data = data;
            iterative(&mut data, direction.sign());
            data
        }
    }
}

fn recursive(input: &[Complex], sign: f64) -> Vec<Complex> {
    let n = input.len();
    if n <= 1 {
        return input.to_vec();
    }

    let even: Vec<Complex> = input.iter().step_by(2).copied().collect();
    let odd: Vec<Complex> = input.iter().skip(1).step_by(2).copied().collect();
    let even = recursive(&even, sign);
    let odd = recursive(&odd, sign);

    let half = n / 2;
    let mut out = vec![Complex::new(0.0, 0.0); n];
    for k in 0..half {
        let t = cis(sign * 2.0 * PI * k as f64 / n as f64) * odd[k];
        out[k] = even[k] + t;
        out[k + half] = even[k] - t;
    }
    out
}

fn iterative(data: &mut [Complex], sign: f64) {
    let n = data.len();
    if n <= 1 {
        return;
    }

    bit_reverse(data);

    let mut size = 2;
    while size <= n {
        let half = size / 2;
        for start in (0..n).step_by(size) {
            for k in 0..half {
                // Direct twiddle evaluation; a running product drifts at large n.
                let w = cis(sign * 2.0 * PI * k as f64 / size as f64);
                let u = data[start + k];
                let t = w * data[start + k + half];
                data[start + k] = u + t;
                data[start + k + half] = u - t;
            }
        }
        size *= 2;
    }
}

fn bit_reverse(data: &mut [Complex]) {
    let n = data.len();
    let shift = usize::BITS - n.trailing_zeros();
    for i in 0..n {
        let j = i.reverse_bits() >> shift;
        if j > i {
            data.swap(i, j);
        }
    }
}
