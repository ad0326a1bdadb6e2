//! Capability traits for the eigensolver that computes Bloch modes.
//!
//! The driver in [`crate::solver`] never touches the numerics directly. A
//! [`ModeSolverBackend`] allocates a [`ModeWorkspace`] sized for one sample
//! grid and band count; the workspace holds the wavevector, the sampled
//! dielectric and the converged eigenvectors until it is dropped.
//!
//! Frequencies carry no 2π factor: a workspace eigenvalue `λ` corresponds to
//! the frequency `sqrt(λ)` and wavevectors are measured in cycles per unit
//! length.

use num_complex::Complex64;

use crate::dielectric::DielectricSample;
use crate::error::EigenmodeError;
use crate::grid::SampleGrid;
use crate::parity::Parity;

/// Maps lattice coordinates `r ∈ [0, 1)³` of the cell to the local
/// permittivity. `None` means the host tensor could not be inverted.
pub type DielectricFn<'a> = dyn Fn([f64; 3]) -> Option<DielectricSample> + 'a;

#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    /// Lowest eigenvalues in ascending order, one per requested band.
    pub eigenvalues: Vec<f64>,
    pub iterations: usize,
    /// False when the eigensolver hit its iteration limit before reaching
    /// the requested tolerance.
    pub converged: bool,
}

pub trait ModeWorkspace: Send + Sync {
    fn grid(&self) -> SampleGrid;

    fn set_parity(&mut self, parity: Parity);

    /// `k` in reciprocal-lattice units; `reciprocal` holds the basis rows.
    fn set_wavevector(&mut self, k: [f64; 3], reciprocal: [[f64; 3]; 3]);

    fn set_dielectric(&mut self, dielectric: &DielectricFn<'_>) -> Result<(), EigenmodeError>;

    /// Number of zero-frequency bands present at zero wavevector.
    fn zero_wavevector_constant_bands(&self) -> usize;

    fn solve(&mut self, num_bands: usize, tolerance: f64) -> Result<SolveOutcome, EigenmodeError>;

    /// dω/dk of the zero-based `band` along the unit cartesian `direction`.
    fn group_velocity(&self, band: usize, direction: [f64; 3]) -> f64;

    /// Periodic part of the magnetic field on the sample grid.
    fn magnetic_field(&self, band: usize) -> Vec<[Complex64; 3]>;

    /// `q × h` on the sample grid, i.e. the displacement field times `-ω`.
    fn displacement_field(&self, band: usize) -> Vec<[Complex64; 3]>;

    fn apply_inverse_epsilon(&self, field: &mut [[Complex64; 3]]);

    fn rephase_band(&mut self, band: usize, phase: Complex64);
}

pub trait ModeSolverBackend {
    fn create_workspace(
        &self,
        grid: SampleGrid,
        num_bands: usize,
    ) -> Result<Box<dyn ModeWorkspace>, EigenmodeError>;

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Whether an eigensolver was built into this process.
#[derive(Debug, Clone)]
pub enum EigensolverCapability<S> {
    Unavailable,
    Available(S),
}

impl<S> EigensolverCapability<S> {
    pub fn is_available(&self) -> bool {
        matches!(self, EigensolverCapability::Available(_))
    }

    pub fn backend(&self) -> Option<&S> {
        match self {
            EigensolverCapability::Available(backend) => Some(backend),
            EigensolverCapability::Unavailable => None,
        }
    }
}
