//! Dense Hermitian eigendecomposition by cyclic complex Jacobi rotations.

use num_complex::Complex64;

pub struct Eigendecomposition {
    /// Ascending.
    pub eigenvalues: Vec<f64>,
    /// Row-major `n × n`; column `j` is the eigenvector of `eigenvalues[j]`.
    pub eigenvectors: Vec<Complex64>,
    pub sweeps: usize,
    pub converged: bool,
}

impl Eigendecomposition {
    pub fn eigenvector(&self, j: usize) -> Vec<Complex64> {
        let n = self.eigenvalues.len();
        (0..n).map(|row| self.eigenvectors[row * n + j]).collect()
    }
}

/// Diagonalizes the row-major Hermitian `matrix` until every off-diagonal
/// entry is below `tolerance` times the largest entry, or `max_sweeps`
/// sweeps have run.
pub fn hermitian_eigendecomposition(
    matrix: &[Complex64],
    n: usize,
    tolerance: f64,
    max_sweeps: usize,
) -> Eigendecomposition {
    let one = Complex64::new(1.0, 0.0);
    let zero = Complex64::new(0.0, 0.0);

    if n == 0 {
        return Eigendecomposition {
            eigenvalues: vec![],
            eigenvectors: vec![],
            sweeps: 0,
            converged: true,
        };
    }

    let mut work = matrix.to_vec();
    let mut vectors = vec![zero; n * n];
    for i in 0..n {
        vectors[i * n + i] = one;
    }

    let scale = work.iter().fold(0.0f64, |acc, v| acc.max(v.norm()));
    let threshold = tolerance * scale;
    let mut sweeps = 0;
    let mut converged = false;

    while sweeps < max_sweeps {
        let mut max_off = 0.0f64;
        for p in 0..n {
            for q in (p + 1)..n {
                max_off = max_off.max(work[p * n + q].norm());
            }
        }
        if max_off <= threshold {
            converged = true;
            break;
        }
        sweeps += 1;

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = work[p * n + q];
                let apq_norm = apq.norm();
                if apq_norm <= threshold {
                    continue;
                }

                let app = work[p * n + p].re;
                let aqq = work[q * n + q].re;
                let phase = apq / apq_norm;

                let tau = (aqq - app) / (2.0 * apq_norm);
                let t = if tau >= 0.0 {
                    1.0 / (tau + (1.0 + tau * tau).sqrt())
                } else {
                    -1.0 / (-tau + (1.0 + tau * tau).sqrt())
                };
                let c = 1.0 / (1.0 + t * t).sqrt();
                let s_phase = phase * (t * c);
                let c_val = Complex64::new(c, 0.0);

                work[p * n + p] = Complex64::new(app - t * apq_norm, 0.0);
                work[q * n + q] = Complex64::new(aqq + t * apq_norm, 0.0);
                work[p * n + q] = zero;
                work[q * n + p] = zero;

                for k in 0..n {
                    if k == p || k == q {
                        continue;
                    }
                    let akp = work[k * n + p];
                    let akq = work[k * n + q];
                    let new_akp = c_val * akp - s_phase.conj() * akq;
                    let new_akq = s_phase * akp + c_val * akq;
                    work[k * n + p] = new_akp;
                    work[p * n + k] = new_akp.conj();
                    work[k * n + q] = new_akq;
                    work[q * n + k] = new_akq.conj();
                }

                for k in 0..n {
                    let vkp = vectors[k * n + p];
                    let vkq = vectors[k * n + q];
                    vectors[k * n + p] = c_val * vkp - s_phase.conj() * vkq;
                    vectors[k * n + q] = s_phase * vkp + c_val * vkq;
                }
            }
        }
    }

    let diagonal: Vec<f64> = (0..n).map(|i| work[i * n + i].re).collect();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| diagonal[a].total_cmp(&diagonal[b]));

    let eigenvalues = order.iter().map(|&i| diagonal[i]).collect();
    let mut eigenvectors = vec![zero; n * n];
    for (new_col, &old_col) in order.iter().enumerate() {
        for row in 0..n {
            eigenvectors[row * n + new_col] = vectors[row * n + old_col];
        }
    }

    Eigendecomposition {
        eigenvalues,
        eigenvectors,
        sweeps,
        converged,
    }
}
