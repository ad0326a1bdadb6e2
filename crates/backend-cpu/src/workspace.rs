//! Dense plane-wave workspace for one sample grid.
//!
//! The magnetic field is expanded in transverse plane waves
//! `h = Σ_G Σ_u x_{G,u} u e^{i (k + G)·r}` with two polarizations `u ⊥ q`,
//! `q = k + G`. In that basis the Maxwell operator `∇ × ε⁻¹ ∇ ×` becomes the
//! Hermitian matrix `M_{ab} = (q_a × u_a)ᵀ η_{G_a - G_b} (q_b × u_b)`, where
//! `η_m` are the Fourier coefficients of the sampled inverse permittivity.
//! Its eigenvalues are the squared frequencies.

use log::debug;
use num_complex::Complex64;

use eigenmode_core::backend::{DielectricFn, ModeWorkspace, SolveOutcome};
use eigenmode_core::dielectric::SymmetricTensor3;
use eigenmode_core::error::EigenmodeError;
use eigenmode_core::grid::SampleGrid;
use eigenmode_core::parity::Parity;

use crate::fft::{Fft3, FftDirection};
use crate::jacobi::hermitian_eigendecomposition;

/// Relative size below which `|q|` counts as zero.
const ZERO_WAVEVECTOR: f64 = 1e-12;

#[derive(Debug, Clone, Copy)]
struct BasisVector {
    /// Grid slot holding the Fourier coefficient of this wave.
    slot: usize,
    m: [i64; 3],
    u: [f64; 3],
    /// `q × u`.
    curl: [f64; 3],
}

pub struct PlaneWaveWorkspace {
    grid: SampleGrid,
    fft: Fft3,
    max_sweeps: usize,
    parity: Parity,
    k: [f64; 3],
    reciprocal: [[f64; 3]; 3],
    eps_inv: Vec<SymmetricTensor3>,
    /// Fourier coefficients of `ε⁻¹` as `[xx, yy, zz, xy, xz, yz]` per slot.
    eta: Vec<[Complex64; 6]>,
    basis: Vec<BasisVector>,
    eigenvalues: Vec<f64>,
    eigenvectors: Vec<Vec<Complex64>>,
}

impl PlaneWaveWorkspace {
    pub fn new(grid: SampleGrid, max_sweeps: usize) -> Self {
        Self {
            grid,
            fft: Fft3::new(grid.n),
            max_sweeps,
            parity: Parity::None,
            k: [0.0; 3],
            reciprocal: grid.reciprocal_basis(),
            eps_inv: Vec::new(),
            eta: Vec::new(),
            basis: Vec::new(),
            eigenvalues: Vec::new(),
            eigenvectors: Vec::new(),
        }
    }

    /// Number of plane-wave states for the current wavevector and parity.
    pub fn basis_len(&self) -> usize {
        self.build_basis().len()
    }

    fn cartesian(&self, lattice: [f64; 3]) -> [f64; 3] {
        let mut out = [0.0; 3];
        for (j, row) in self.reciprocal.iter().enumerate() {
            for i in 0..3 {
                out[i] += lattice[j] * row[i];
            }
        }
        out
    }

    fn build_basis(&self) -> Vec<BasisVector> {
        let n = self.grid.n;
        let k_cart = self.cartesian(self.k);
        let reference = self
            .reciprocal
            .iter()
            .map(|row| norm(*row))
            .fold(f64::INFINITY, f64::min);

        let mut basis = Vec::with_capacity(2 * self.grid.len());
        for ix in 0..n[0] {
            for iy in 0..n[1] {
                for iz in 0..n[2] {
                    let m = [
                        centered(ix, n[0]),
                        centered(iy, n[1]),
                        centered(iz, n[2]),
                    ];
                    let g = self.cartesian(m.map(|v| v as f64));
                    let q = [k_cart[0] + g[0], k_cart[1] + g[1], k_cart[2] + g[2]];
                    if norm(q) <= ZERO_WAVEVECTOR * reference {
                        continue;
                    }
                    for u in transverse_polarizations(q) {
                        if !parity_admits(self.parity, u) {
                            continue;
                        }
                        basis.push(BasisVector {
                            slot: self.grid.idx(ix, iy, iz),
                            m,
                            u,
                            curl: cross(q, u),
                        });
                    }
                }
            }
        }
        basis
    }

    fn eta_between(&self, a: &BasisVector, b: &BasisVector) -> [[Complex64; 3]; 3] {
        let n = self.grid.n;
        let d = [0, 1, 2].map(|i| (a.m[i] - b.m[i]).rem_euclid(n[i] as i64) as usize);
        let [xx, yy, zz, xy, xz, yz] = self.eta[self.grid.idx(d[0], d[1], d[2])];
        [[xx, xy, xz], [xy, yy, yz], [xz, yz, zz]]
    }

    fn assemble(&self, basis: &[BasisVector]) -> Vec<Complex64> {
        let dim = basis.len();
        let mut matrix = vec![Complex64::new(0.0, 0.0); dim * dim];
        for (i, a) in basis.iter().enumerate() {
            for (j, b) in basis.iter().enumerate().skip(i) {
                let value = bilinear(&a.curl, &self.eta_between(a, b), &b.curl);
                matrix[i * dim + j] = value;
                matrix[j * dim + i] = value.conj();
            }
        }
        matrix
    }

    /// Sums `x_a * vector(a)` into the grid slots and transforms to real space.
    fn synthesize(&self, band: usize, vector: impl Fn(&BasisVector) -> [f64; 3]) -> Vec<[Complex64; 3]> {
        let len = self.grid.len();
        let mut components = vec![vec![Complex64::new(0.0, 0.0); len]; 3];
        if let Some(x) = self.eigenvectors.get(band) {
            for (coefficient, wave) in x.iter().zip(&self.basis) {
                let v = vector(wave);
                for axis in 0..3 {
                    components[axis][wave.slot] += coefficient * v[axis];
                }
            }
        }
        for component in components.iter_mut() {
            self.fft.process(component, FftDirection::Inverse);
        }
        (0..len)
            .map(|i| [components[0][i], components[1][i], components[2][i]])
            .collect()
    }
}

impl ModeWorkspace for PlaneWaveWorkspace {
    fn grid(&self) -> SampleGrid {
        self.grid
    }

    fn set_parity(&mut self, parity: Parity) {
        self.parity = parity;
    }

    fn set_wavevector(&mut self, k: [f64; 3], reciprocal: [[f64; 3]; 3]) {
        self.k = k;
        self.reciprocal = reciprocal;
    }

    fn set_dielectric(&mut self, dielectric: &DielectricFn<'_>) -> Result<(), EigenmodeError> {
        let n = self.grid.n;
        let len = self.grid.len();
        let mut eps_inv = Vec::with_capacity(len);
        for ix in 0..n[0] {
            for iy in 0..n[1] {
                for iz in 0..n[2] {
                    let r = self.grid.lattice_point(ix, iy, iz);
                    let sample = dielectric(r).ok_or_else(|| {
                        EigenmodeError::InvalidDielectric(format!(
                            "singular inverse permittivity at lattice point {r:?}"
                        ))
                    })?;
                    if !sample.is_valid() {
                        return Err(EigenmodeError::InvalidDielectric(format!(
                            "permittivity is not positive definite at lattice point {r:?}"
                        )));
                    }
                    eps_inv.push(sample.eps_inv);
                }
            }
        }

        let mut eta = vec![[Complex64::new(0.0, 0.0); 6]; len];
        let mut buffer = vec![Complex64::new(0.0, 0.0); len];
        for component in 0..6 {
            for (value, tensor) in buffer.iter_mut().zip(&eps_inv) {
                *value = Complex64::new(tensor.components()[component], 0.0);
            }
            self.fft.process(&mut buffer, FftDirection::Forward);
            for (slot, value) in buffer.iter().enumerate() {
                eta[slot][component] = value / len as f64;
            }
        }

        self.eps_inv = eps_inv;
        self.eta = eta;
        Ok(())
    }

    /// The `q = 0` wave carries two uniform polarizations; a z-parity keeps
    /// only one of them.
    fn zero_wavevector_constant_bands(&self) -> usize {
        match self.parity {
            Parity::None => 2,
            Parity::EvenZ | Parity::OddZ => 1,
        }
    }

    fn solve(&mut self, num_bands: usize, tolerance: f64) -> Result<SolveOutcome, EigenmodeError> {
        if self.eta.is_empty() {
            return Err(EigenmodeError::Configuration(
                "dielectric must be set before solving".into(),
            ));
        }
        let basis = self.build_basis();
        let dim = basis.len();
        if dim < num_bands {
            return Err(EigenmodeError::Geometry(format!(
                "sample grid supports {dim} plane-wave states, {num_bands} bands requested"
            )));
        }

        let matrix = self.assemble(&basis);
        let decomposition = hermitian_eigendecomposition(&matrix, dim, tolerance, self.max_sweeps);
        debug!(
            "plane-wave solve: {dim} states, {} sweeps (converged: {}), lowest eigenvalue {:?}",
            decomposition.sweeps,
            decomposition.converged,
            decomposition.eigenvalues.first()
        );

        self.eigenvalues = decomposition.eigenvalues[..num_bands].to_vec();
        self.eigenvectors = (0..num_bands).map(|j| decomposition.eigenvector(j)).collect();
        self.basis = basis;

        Ok(SolveOutcome {
            eigenvalues: self.eigenvalues.clone(),
            iterations: decomposition.sweeps,
            converged: decomposition.converged,
        })
    }

    fn group_velocity(&self, band: usize, direction: [f64; 3]) -> f64 {
        let (Some(&lambda), Some(x)) = (self.eigenvalues.get(band), self.eigenvectors.get(band))
        else {
            return 0.0;
        };
        if lambda <= 0.0 {
            return 0.0;
        }

        // Hellmann–Feynman: dλ/dk = 2 Re Σ (d × h')* η (q × h).
        let mut sum = Complex64::new(0.0, 0.0);
        for (a, xa) in self.basis.iter().zip(x) {
            let d_cross_u = cross(direction, a.u);
            for (b, xb) in self.basis.iter().zip(x) {
                let value = bilinear(&d_cross_u, &self.eta_between(a, b), &b.curl);
                sum += xa.conj() * value * xb;
            }
        }
        sum.re / lambda.sqrt()
    }

    fn magnetic_field(&self, band: usize) -> Vec<[Complex64; 3]> {
        self.synthesize(band, |wave| wave.u)
    }

    fn displacement_field(&self, band: usize) -> Vec<[Complex64; 3]> {
        self.synthesize(band, |wave| wave.curl)
    }

    fn apply_inverse_epsilon(&self, field: &mut [[Complex64; 3]]) {
        for (value, tensor) in field.iter_mut().zip(&self.eps_inv) {
            *value = tensor.apply(*value);
        }
    }

    fn rephase_band(&mut self, band: usize, phase: Complex64) {
        if let Some(x) = self.eigenvectors.get_mut(band) {
            for coefficient in x.iter_mut() {
                *coefficient *= phase;
            }
        }
    }
}

// ============================================================================
// Plane-wave helpers
// ============================================================================

/// Integer frequency of FFT slot `i` on an axis of `n` samples.
fn centered(i: usize, n: usize) -> i64 {
    if i <= n / 2 {
        i as i64
    } else {
        i as i64 - n as i64
    }
}

/// Two unit vectors orthogonal to `q` and to each other. For `q` in the xy
/// plane the first one is `ẑ`.
fn transverse_polarizations(q: [f64; 3]) -> [[f64; 3]; 2] {
    let len = norm(q);
    let q_hat = q.map(|v| v / len);
    let reference = if q_hat[2].abs() < 0.9 {
        [0.0, 0.0, 1.0]
    } else {
        [1.0, 0.0, 0.0]
    };
    let along = dot(reference, q_hat);
    let u1 = normalize([
        reference[0] - along * q_hat[0],
        reference[1] - along * q_hat[1],
        reference[2] - along * q_hat[2],
    ]);
    let u2 = cross(q_hat, u1);
    [u1, u2]
}

/// Even-z modes have H along z; odd-z modes have H in the plane.
fn parity_admits(parity: Parity, u: [f64; 3]) -> bool {
    match parity {
        Parity::None => true,
        Parity::EvenZ => u[2].abs() > 0.5,
        Parity::OddZ => u[2].abs() <= 0.5,
    }
}

fn bilinear(left: &[f64; 3], eta: &[[Complex64; 3]; 3], right: &[f64; 3]) -> Complex64 {
    let mut sum = Complex64::new(0.0, 0.0);
    for i in 0..3 {
        if left[i] == 0.0 {
            continue;
        }
        for j in 0..3 {
            sum += eta[i][j] * (left[i] * right[j]);
        }
    }
    sum
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn norm(v: [f64; 3]) -> f64 {
    dot(v, v).sqrt()
}

fn normalize(v: [f64; 3]) -> [f64; 3] {
    let len = norm(v);
    v.map(|c| c / len)
}
