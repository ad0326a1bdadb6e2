//! Eigenmode solve driver: geometry setup, wavevector seeding and Newton
//! frequency matching on top of an eigensolver capability.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::backend::{EigensolverCapability, ModeSolverBackend};
use crate::dielectric::{DielectricSample, SymmetricTensor3};
use crate::eigenmode::{EigenmodeData, Magnetic, ModeSummary, WorkspaceGuard};
use crate::error::EigenmodeError;
use crate::geometry::{Component, Dimensionality, Direction, Vec3, Volume};
use crate::grid::SampleGrid;
use crate::host::FieldHost;
use crate::io::EigenmodeConfig;
use crate::parity::Parity;
use crate::phase;

fn default_tolerance() -> f64 {
    1e-7
}

fn default_match() -> bool {
    true
}

/// Parameters of one eigenmode solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeRequest {
    pub target_frequency: f64,
    /// Propagation direction; power flows through the source volume along it.
    pub direction: Direction,
    pub source_volume: Volume,
    /// Cross-section whose periodic extension defines the eigenproblem.
    pub enclosing_volume: Volume,
    /// One-based band number.
    pub band: usize,
    /// Reciprocal-lattice units of the enclosing volume; zero means seed
    /// from the target frequency.
    #[serde(default)]
    pub wavevector_guess: Vec3,
    #[serde(default = "default_match")]
    pub match_frequency: bool,
    #[serde(default)]
    pub parity: Parity,
    /// Samples per unit length; `<= 0` means twice the host resolution.
    #[serde(default)]
    pub resolution: f64,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

impl ModeRequest {
    pub fn new(target_frequency: f64, direction: Direction, volume: Volume, band: usize) -> Self {
        Self {
            target_frequency,
            direction,
            source_volume: volume,
            enclosing_volume: volume,
            band,
            wavevector_guess: Vec3::ZERO,
            match_frequency: true,
            parity: Parity::None,
            resolution: 0.0,
            tolerance: default_tolerance(),
        }
    }
}

pub struct EigenmodeSolver<S> {
    capability: EigensolverCapability<S>,
    config: EigenmodeConfig,
}

impl<S: ModeSolverBackend> EigenmodeSolver<S> {
    pub fn new(backend: S) -> Self {
        Self::with_capability(EigensolverCapability::Available(backend))
    }

    pub fn unavailable() -> Self {
        Self::with_capability(EigensolverCapability::Unavailable)
    }

    pub fn with_capability(capability: EigensolverCapability<S>) -> Self {
        Self {
            capability,
            config: EigenmodeConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EigenmodeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EigenmodeConfig {
        &self.config
    }

    pub fn is_available(&self) -> bool {
        self.capability.is_available()
    }

    /// A request with the configured default parity.
    pub fn mode_request(
        &self,
        target_frequency: f64,
        direction: Direction,
        volume: Volume,
        band: usize,
    ) -> ModeRequest {
        let mut request = ModeRequest::new(target_frequency, direction, volume, band);
        request.parity = self.config.default_parity;
        request
    }

    /// Solves for the requested band and returns its magnetic field.
    pub fn solve<H: FieldHost + ?Sized>(
        &self,
        host: &H,
        request: &ModeRequest,
    ) -> Result<EigenmodeData<Magnetic>, EigenmodeError> {
        let backend = self.capability.backend().ok_or_else(|| {
            EigenmodeError::Configuration(
                "no eigensolver was built in; eigenmode sources and mode coefficients need one"
                    .into(),
            )
        })?;

        let dim = host.dimensionality();
        validate(dim, request)?;

        let resolution = if request.resolution > 0.0 {
            request.resolution
        } else {
            2.0 * host.resolution()
        };

        // ====================================================================
        // Cell geometry and wavevector guess
        // ====================================================================

        let enclosing = &request.enclosing_volume;
        let center = enclosing.center();
        let mut origin = center.to_array();
        let mut extents = [0.0; 3];
        let mut k = [0.0; 3];
        for &d in dim.active_directions() {
            let i = d.index();
            origin[i] = enclosing.min_in(d);
            extents[i] = enclosing.extent(d);
            k[i] = request.wavevector_guess.in_direction(d);
        }
        if dim == Dimensionality::D2 {
            k[2] = request.wavevector_guess.z;
        }

        let axis = request.direction.index();
        if request.match_frequency && k.iter().all(|&v| v == 0.0) {
            k[axis] = request.target_frequency * host.eps(&center).sqrt();
            if extents[axis] > 0.0 {
                let clamp = self.config.brillouin_clamp;
                k[axis] = (k[axis] * extents[axis]).clamp(-clamp, clamp);
            }
            debug!(
                "seeded wavevector guess k[{}] = {:.6} (lattice units)",
                request.direction, k[axis]
            );
        }

        let grid = SampleGrid::from_extents(extents, resolution);
        let reciprocal = grid.reciprocal_basis();
        let k0_cart = grid.to_cartesian(k);
        let k0_len = norm(k0_cart);
        if request.match_frequency && k0_len == 0.0 {
            return Err(EigenmodeError::Convergence(
                "need a nonzero wavevector guess to match the frequency".into(),
            ));
        }
        let k_dir = if k0_len > 0.0 {
            [k0_cart[0] / k0_len, k0_cart[1] / k0_len, k0_cart[2] / k0_len]
        } else {
            [0.0; 3]
        };

        debug!(
            "eigenmode cell {}x{}x{} (s = {:?}), resolution {resolution}",
            grid.n[0], grid.n[1], grid.n[2], grid.s
        );

        let mut workspace = WorkspaceGuard::new(backend.create_workspace(grid, request.band)?);
        {
            let ws = workspace.get_mut();
            ws.set_parity(request.parity);
            ws.set_wavevector(k, reciprocal);
        }

        let mut band = request.band;
        if k.iter().all(|&v| v == 0.0) {
            let constant = workspace.get().zero_wavevector_constant_bands().min(band);
            if band == constant {
                return Err(EigenmodeError::Geometry(format!(
                    "band {band} is a zero-frequency band at zero wavevector"
                )));
            }
            band -= constant;
        }

        let dielectric = |r: [f64; 3]| -> Option<DielectricSample> {
            let mut p = Vec3::from_array(origin);
            for &d in dim.active_directions() {
                let i = d.index();
                p.set_direction(d, origin[i] + r[i] * grid.s[i]);
            }
            DielectricSample::from_inverse(inverse_permittivity(host, &p))
        };
        workspace.get_mut().set_dielectric(&dielectric)?;

        // ====================================================================
        // Eigensolve with optional Newton frequency matching
        // ====================================================================

        let target = request.target_frequency;
        let match_tol = self.config.match_tolerance_factor * request.tolerance;
        let [scale_lo, scale_hi] = self.config.newton_scale_bounds;
        let mut scale = 1.0;
        let mut k_current = k;
        let mut residuals = Vec::new();
        let mut iterations = 0;
        let mut converged = true;

        let (omega, vg) = loop {
            let ws = workspace.get_mut();
            let outcome = ws.solve(band, request.tolerance)?;
            iterations += outcome.iterations;
            if !outcome.converged {
                warn!(
                    "eigensolver stopped after {} iterations above tolerance {:e}",
                    outcome.iterations, request.tolerance
                );
                converged = false;
            }
            let eigenvalue = outcome.eigenvalues.get(band - 1).copied().ok_or_else(|| {
                EigenmodeError::Geometry(format!(
                    "eigensolver returned {} bands, band {band} requested",
                    outcome.eigenvalues.len()
                ))
            })?;
            let omega = eigenvalue.max(0.0).sqrt();
            let vg = if k0_len > 0.0 {
                ws.group_velocity(band - 1, k_dir)
            } else {
                0.0
            };
            debug!(
                "eigensolve band {band}: omega = {omega:.9}, vg = {vg:.6}, k = {:?} ({} iterations)",
                k_current, outcome.iterations
            );

            if !request.match_frequency {
                break (omega, vg);
            }

            let residual = (omega - target).abs();
            residuals.push(residual);
            if residual <= match_tol * target {
                break (omega, vg);
            }
            if residuals.len() >= self.config.max_newton_iterations {
                return Err(EigenmodeError::Convergence(format!(
                    "no match within {} iterations (|omega - target| = {residual:e})",
                    residuals.len()
                )));
            }

            scale -= (omega - target) / (vg * k0_len);
            debug!("Newton step: scale = {scale:.9}, residual = {residual:e}");
            if !(scale >= scale_lo && scale <= scale_hi) {
                return Err(EigenmodeError::Convergence(format!(
                    "need a better starting wavevector (scale = {scale})"
                )));
            }

            k_current = [k[0] * scale, k[1] * scale, k[2] * scale];
            ws.set_wavevector(k_current, reciprocal);
        };

        let mut samples = workspace.get().magnetic_field(band - 1);
        let phase = phase::canonicalize(&mut samples);
        workspace.get_mut().rephase_band(band - 1, phase);

        info!(
            "solved band {band} at frequency {omega:.9} (target {target}), k = {k_current:?}, vg = {vg:.6}"
        );

        let summary = ModeSummary {
            band,
            target_frequency: target,
            solved_frequency: omega,
            wavevector: k_current,
            group_velocity: vg,
            newton_residuals: residuals,
            solver_iterations: iterations,
            solver_converged: converged,
        };
        let domain_center = center - request.source_volume.center();
        Ok(EigenmodeData::from_solve(summary, domain_center, samples, workspace))
    }
}

fn validate(dim: Dimensionality, request: &ModeRequest) -> Result<(), EigenmodeError> {
    if !dim.accepts_propagation(request.direction) {
        return Err(EigenmodeError::Geometry(format!(
            "direction {} is not valid in a {dim:?} cell",
            request.direction
        )));
    }
    if request.source_volume.dim != dim || request.enclosing_volume.dim != dim {
        return Err(EigenmodeError::Geometry(format!(
            "eigenmode volumes must match the host dimensionality {dim:?}"
        )));
    }
    if !request.enclosing_volume.contains(&request.source_volume) {
        return Err(EigenmodeError::Geometry(
            "source volume lies outside the eigenmode volume".into(),
        ));
    }
    if request.band == 0 {
        return Err(EigenmodeError::Geometry("band numbers start at 1".into()));
    }
    let f = request.target_frequency;
    if !f.is_finite() || (request.match_frequency && f <= 0.0) {
        return Err(EigenmodeError::Geometry(format!(
            "invalid target frequency {f}"
        )));
    }
    Ok(())
}

fn inverse_permittivity<H: FieldHost + ?Sized>(host: &H, p: &Vec3) -> SymmetricTensor3 {
    SymmetricTensor3 {
        xx: host.chi1inv(Component::Ex, Direction::X, p),
        yy: host.chi1inv(Component::Ey, Direction::Y, p),
        zz: host.chi1inv(Component::Ez, Direction::Z, p),
        xy: host.chi1inv(Component::Ex, Direction::Y, p),
        xz: host.chi1inv(Component::Ex, Direction::Z, p),
        yz: host.chi1inv(Component::Ey, Direction::Z, p),
    }
}

fn norm(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}
