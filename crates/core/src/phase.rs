//! Canonical global phase for sampled mode fields.
//!
//! An eigenvector is only defined up to a complex phase. We pick the phase
//! that maximizes the squared real part summed over all samples, then fix
//! the remaining sign from a reference sample, so repeated solves of the
//! same mode give reproducible fields.

use num_complex::Complex64;

/// Rotates `samples` in place and returns the applied phase factor.
pub fn canonicalize(samples: &mut [[Complex64; 3]]) -> Complex64 {
    let (mut sum_cross, mut sum_diff) = (0.0, 0.0);
    for v in samples.iter().flatten() {
        sum_cross += 2.0 * v.re * v.im;
        sum_diff += v.re * v.re - v.im * v.im;
    }
    let theta = 0.5 * f64::atan2(-sum_cross, sum_diff);
    let mut phase = Complex64::from_polar(1.0, theta);

    let max_re = samples
        .iter()
        .flatten()
        .map(|v| (v * phase).re.abs())
        .fold(0.0f64, f64::max);
    let reference = samples
        .iter()
        .flatten()
        .map(|v| (v * phase).re)
        .filter(|re| re.abs() >= 0.5 * max_re)
        .last();
    if matches!(reference, Some(re) if re < 0.0) {
        phase = -phase;
    }

    for v in samples.iter_mut().flatten() {
        *v *= phase;
    }
    phase
}
