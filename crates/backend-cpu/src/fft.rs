//! Three-dimensional FFTs over row-major sample grids.

use std::sync::Arc;

use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FftDirection {
    Forward,
    Inverse,
}

/// Separable 3-D transform built from one planned 1-D FFT per axis. Both
/// directions are unnormalized, matching rustfft.
pub struct Fft3 {
    n: [usize; 3],
    forward: [Arc<dyn Fft<f64>>; 3],
    inverse: [Arc<dyn Fft<f64>>; 3],
}

impl Fft3 {
    pub fn new(n: [usize; 3]) -> Self {
        let mut planner = FftPlanner::new();
        let forward = n.map(|len| planner.plan_fft_forward(len));
        let inverse = n.map(|len| planner.plan_fft_inverse(len));
        Self {
            n,
            forward,
            inverse,
        }
    }

    pub fn len(&self) -> usize {
        self.n.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Transforms `data` in place, laid out as `(ix * ny + iy) * nz + iz`.
    pub fn process(&self, data: &mut [Complex64], direction: FftDirection) {
        debug_assert_eq!(data.len(), self.len());
        let strides = [self.n[1] * self.n[2], self.n[2], 1];
        for axis in 0..3 {
            let len = self.n[axis];
            if len <= 1 {
                continue;
            }
            let plan = match direction {
                FftDirection::Forward => &self.forward[axis],
                FftDirection::Inverse => &self.inverse[axis],
            };
            let stride = strides[axis];
            let mut line = vec![Complex64::new(0.0, 0.0); len];
            let mut scratch = vec![Complex64::new(0.0, 0.0); plan.get_inplace_scratch_len()];

            for start in 0..data.len() {
                if (start / stride) % len != 0 {
                    continue;
                }
                for (i, value) in line.iter_mut().enumerate() {
                    *value = data[start + i * stride];
                }
                plan.process_with_scratch(&mut line, &mut scratch);
                for (i, value) in line.iter().enumerate() {
                    data[start + i * stride] = *value;
                }
            }
        }
    }
}
