//! Solved eigenmodes and their field representation.
//!
//! [`EigenmodeData`] owns the eigensolver workspace it was solved in. The
//! type parameter records whether the stored samples are the magnetic field
//! (as produced by the solver) or the electric field; the only transition is
//! the consuming [`EigenmodeData::into_electric`].

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use log::trace;
use num_complex::Complex64;

use crate::backend::ModeWorkspace;
use crate::geometry::{Direction, Vec3};
use crate::grid::SampleGrid;
use crate::sampler;

/// Samples hold the periodic part of H.
#[derive(Debug, Clone, Copy)]
pub struct Magnetic;

/// Samples hold the periodic part of E.
#[derive(Debug, Clone, Copy)]
pub struct Electric;

pub trait FieldKind: Send + Sync + 'static {
    const NAME: &'static str;
}

impl FieldKind for Magnetic {
    const NAME: &'static str = "magnetic";
}

impl FieldKind for Electric {
    const NAME: &'static str = "electric";
}

/// Spatial weighting applied on top of the interpolated mode amplitude.
pub type Envelope = Arc<dyn Fn(&Vec3) -> Complex64 + Send + Sync>;

/// Owns a workspace and logs its release.
pub(crate) struct WorkspaceGuard {
    inner: Box<dyn ModeWorkspace>,
}

impl WorkspaceGuard {
    pub(crate) fn new(inner: Box<dyn ModeWorkspace>) -> Self {
        Self { inner }
    }

    pub(crate) fn get(&self) -> &dyn ModeWorkspace {
        self.inner.as_ref()
    }

    pub(crate) fn get_mut(&mut self) -> &mut dyn ModeWorkspace {
        self.inner.as_mut()
    }
}

impl Drop for WorkspaceGuard {
    fn drop(&mut self) {
        let grid = self.inner.grid();
        trace!("released eigenmode workspace ({}x{}x{})", grid.n[0], grid.n[1], grid.n[2]);
    }
}

/// Scalar results of a solve, shared by both field representations.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeSummary {
    pub band: usize,
    pub target_frequency: f64,
    pub solved_frequency: f64,
    /// Reciprocal-lattice units.
    pub wavevector: [f64; 3],
    pub group_velocity: f64,
    pub newton_residuals: Vec<f64>,
    pub solver_iterations: usize,
    /// Whether every eigensolve reached its tolerance.
    pub solver_converged: bool,
}

pub struct EigenmodeData<K: FieldKind> {
    summary: ModeSummary,
    grid: SampleGrid,
    domain_center: Vec3,
    samples: Vec<[Complex64; 3]>,
    envelope: Option<Envelope>,
    workspace: WorkspaceGuard,
    kind: PhantomData<K>,
}

impl<K: FieldKind> fmt::Debug for EigenmodeData<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EigenmodeData")
            .field("kind", &K::NAME)
            .field("summary", &self.summary)
            .field("grid", &self.grid)
            .field("domain_center", &self.domain_center)
            .field("has_envelope", &self.envelope.is_some())
            .finish()
    }
}

impl<K: FieldKind> EigenmodeData<K> {
    pub fn band(&self) -> usize {
        self.summary.band
    }

    pub fn target_frequency(&self) -> f64 {
        self.summary.target_frequency
    }

    pub fn solved_frequency(&self) -> f64 {
        self.summary.solved_frequency
    }

    pub fn wavevector(&self) -> [f64; 3] {
        self.summary.wavevector
    }

    pub fn wavevector_cartesian(&self) -> [f64; 3] {
        self.grid.to_cartesian(self.summary.wavevector)
    }

    pub fn group_velocity(&self) -> f64 {
        self.summary.group_velocity
    }

    pub fn newton_residuals(&self) -> &[f64] {
        &self.summary.newton_residuals
    }

    pub fn solver_iterations(&self) -> usize {
        self.summary.solver_iterations
    }

    pub fn solver_converged(&self) -> bool {
        self.summary.solver_converged
    }

    pub fn summary(&self) -> &ModeSummary {
        &self.summary
    }

    pub fn grid(&self) -> &SampleGrid {
        &self.grid
    }

    pub fn domain_center(&self) -> Vec3 {
        self.domain_center
    }

    pub fn samples(&self) -> &[[Complex64; 3]] {
        &self.samples
    }

    pub fn with_envelope(mut self, envelope: Option<Envelope>) -> Self {
        self.envelope = envelope;
        self
    }

    /// Mode amplitude of component `axis` at `point`, given relative to the
    /// source volume center, times the envelope.
    pub fn amplitude(&self, point: &Vec3, axis: Direction) -> Complex64 {
        let value =
            sampler::amplitude(&self.grid, &self.domain_center, &self.samples, point, axis);
        match &self.envelope {
            Some(envelope) => value * envelope(point),
            None => value,
        }
    }
}

impl EigenmodeData<Magnetic> {
    pub(crate) fn from_solve(
        summary: ModeSummary,
        domain_center: Vec3,
        samples: Vec<[Complex64; 3]>,
        workspace: WorkspaceGuard,
    ) -> Self {
        Self {
            grid: workspace.get().grid(),
            summary,
            domain_center,
            samples,
            envelope: None,
            workspace,
            kind: PhantomData,
        }
    }

    /// Replaces the magnetic samples by the electric field
    /// `E = ε⁻¹ D` with `D = -(q × h) / ω`.
    ///
    /// Solved modes always have nonzero frequency; the zero-frequency bands
    /// at zero wavevector are skipped by the solver.
    pub fn into_electric(self) -> EigenmodeData<Electric> {
        let band_index = self.summary.band - 1;
        let workspace = self.workspace;
        let mut field = workspace.get().displacement_field(band_index);
        let scale = -1.0 / self.summary.solved_frequency;
        for v in field.iter_mut().flatten() {
            *v *= scale;
        }
        workspace.get().apply_inverse_epsilon(&mut field);

        EigenmodeData {
            summary: self.summary,
            grid: self.grid,
            domain_center: self.domain_center,
            samples: field,
            envelope: self.envelope,
            workspace,
            kind: PhantomData,
        }
    }
}
