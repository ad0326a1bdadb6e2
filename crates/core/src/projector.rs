//! Mode-expansion coefficients of recorded flux fields.
//!
//! The coefficient of band `b` at one frequency is the overlap of the
//! recorded tangential fields with the solved mode over the flux plane,
//! normalized by the self-overlap of the recorded fields. Overlaps are
//! reduced over all processes, so every process must call
//! [`ModeProjector::coefficient`] the same number of times in the same
//! order.

use log::{debug, warn};
use num_complex::Complex64;
use rayon::prelude::*;

use crate::backend::ModeSolverBackend;
use crate::collective::Collective;
use crate::eigenmode::{EigenmodeData, FieldKind};
use crate::error::EigenmodeError;
use crate::flux::{FluxRecord, FluxSnapshot, SnapshotChunk};
use crate::geometry::{cross_partner, Component, Direction, Vec3, Volume};
use crate::host::FieldHost;
use crate::parity::Parity;
use crate::solver::{EigenmodeSolver, ModeRequest};

/// Wavevector guess for `(frequency, band)`, in reciprocal-lattice units.
pub type WavevectorGuess<'a> = dyn Fn(f64, usize) -> Vec3 + 'a;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeCoefficient {
    pub value: Complex64,
    pub group_velocity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModeCoefficients {
    pub bands: Vec<usize>,
    pub frequencies: Vec<f64>,
    /// `values[band][freq]`.
    pub values: Vec<Vec<Complex64>>,
    /// `group_velocities[band][freq]`.
    pub group_velocities: Vec<Vec<f64>>,
}

pub struct ModeProjector<'a, S> {
    solver: &'a EigenmodeSolver<S>,
}

impl<'a, S: ModeSolverBackend> ModeProjector<'a, S> {
    pub fn new(solver: &'a EigenmodeSolver<S>) -> Self {
        Self { solver }
    }

    /// Solve parameters used for a projection onto `band` at `frequency`.
    pub fn mode_request<H: FieldHost + ?Sized>(
        &self,
        host: &H,
        frequency: f64,
        direction: Direction,
        volume: &Volume,
        band: usize,
        guess: Option<&WavevectorGuess<'_>>,
    ) -> ModeRequest {
        let mut request = ModeRequest::new(frequency, direction, *volume, band);
        request.wavevector_guess = guess.map_or(Vec3::ZERO, |g| g(frequency, band));
        request.match_frequency = true;
        request.parity = Parity::None;
        request.resolution = host.resolution();
        request.tolerance = self.solver.config().projection_tolerance;
        request
    }

    /// Coefficient of `band` at frequency `freq_index` of `snapshot`, over
    /// the snapshot's volume with power flowing along `direction`.
    #[allow(clippy::too_many_arguments)]
    pub fn coefficient<H, C>(
        &self,
        host: &H,
        comm: &C,
        snapshot: &FluxSnapshot,
        freq_index: usize,
        direction: Direction,
        band: usize,
        guess: Option<&WavevectorGuess<'_>>,
    ) -> Result<ModeCoefficient, EigenmodeError>
    where
        H: FieldHost + ?Sized,
        C: Collective + ?Sized,
    {
        snapshot.validate()?;
        if freq_index >= snapshot.num_freqs {
            return Err(EigenmodeError::Geometry(format!(
                "frequency index {freq_index} out of range ({} recorded)",
                snapshot.num_freqs
            )));
        }
        let frequency = snapshot.frequency(freq_index);
        let volume = &snapshot.volume;
        let request = self.mode_request(host, frequency, direction, volume, band, guess);
        let origin = volume.center();

        let magnetic = self.solver.solve(host, &request)?;
        let group_velocity = magnetic.group_velocity();

        let mut totals = [Complex64::new(0.0, 0.0); 2];
        // E flux against the mode's H.
        for c in Component::ELECTRIC {
            if let Some((axis, sign)) = cross_partner(c.direction(), direction) {
                accumulate(&mut totals, snapshot, freq_index, c, &magnetic, axis, sign, &origin);
            }
        }
        let electric = magnetic.into_electric();
        // H flux against the mode's E.
        for c in Component::MAGNETIC {
            if let Some((axis, sign)) = cross_partner(c.direction(), direction) {
                accumulate(&mut totals, snapshot, freq_index, c, &electric, axis, -sign, &origin);
            }
        }
        drop(electric);

        let reduced = comm.sum_to_all("mode-coefficient", &totals)?;
        let (num, den) = (reduced[0], reduced[1]);
        debug!("band {band} at frequency {frequency}: overlap {num}, flux norm {den}");

        let value = if den.norm() == 0.0 {
            warn!(
                "flux fields vanish on the projection volume (band {band}, frequency {frequency}); \
                 coefficient set to zero"
            );
            Complex64::new(0.0, 0.0)
        } else {
            num / den
        };

        Ok(ModeCoefficient {
            value,
            group_velocity,
        })
    }

    /// Coefficients for every band in `bands` at every recorded frequency.
    #[allow(clippy::too_many_arguments)]
    pub fn coefficients<H, C>(
        &self,
        host: &H,
        comm: &C,
        record: &FluxRecord,
        direction: Direction,
        volume: &Volume,
        bands: &[usize],
        guess: Option<&WavevectorGuess<'_>>,
    ) -> Result<ModeCoefficients, EigenmodeError>
    where
        H: FieldHost + ?Sized,
        C: Collective + ?Sized,
    {
        let snapshot = FluxSnapshot::capture(record, volume)?;
        let mut values = Vec::with_capacity(bands.len());
        let mut group_velocities = Vec::with_capacity(bands.len());
        for &band in bands {
            let mut row = Vec::with_capacity(record.num_freqs);
            let mut vg_row = Vec::with_capacity(record.num_freqs);
            for freq_index in 0..record.num_freqs {
                let coefficient =
                    self.coefficient(host, comm, &snapshot, freq_index, direction, band, guess)?;
                row.push(coefficient.value);
                vg_row.push(coefficient.group_velocity);
            }
            values.push(row);
            group_velocities.push(vg_row);
        }
        Ok(ModeCoefficients {
            bands: bands.to_vec(),
            frequencies: record.frequencies(),
            values,
            group_velocities,
        })
    }
}

#[allow(clippy::too_many_arguments)]
fn accumulate<K: FieldKind>(
    totals: &mut [Complex64; 2],
    snapshot: &FluxSnapshot,
    freq_index: usize,
    component: Component,
    mode: &EigenmodeData<K>,
    axis: Direction,
    sign: f64,
    origin: &Vec3,
) {
    let chunks: Vec<&SnapshotChunk> = snapshot.chunks_for(component).collect();
    let partials: Vec<[Complex64; 2]> = chunks
        .par_iter()
        .map(|chunk| {
            let mut num = Complex64::new(0.0, 0.0);
            let mut den = Complex64::new(0.0, 0.0);
            let values = &chunk.values[freq_index];
            for ((position, &weight), &flux) in
                chunk.positions.iter().zip(&chunk.weights).zip(values)
            {
                let m = mode.amplitude(&(*position - *origin), axis);
                num += m * flux * (weight * sign);
                den += weight * flux.norm_sqr();
            }
            [num, den]
        })
        .collect();
    for [num, den] in partials {
        totals[0] += num;
        totals[1] += den;
    }
}
