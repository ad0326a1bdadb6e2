//! Eigenmode sources: equivalent surface currents of a solved mode.
//!
//! By the equivalence principle a mode crossing a plane with normal `d` is
//! reproduced by the electric current `J = d × H` and the magnetic current
//! `K = -d × E` on that plane. Each tangential current component becomes
//! one volume source on the host whose spatial amplitude samples the mode.

use log::debug;
use num_complex::Complex64;

use crate::backend::ModeSolverBackend;
use crate::eigenmode::Envelope;
use crate::error::EigenmodeError;
use crate::geometry::{cross_partner, Component, ComponentMask, Dimensionality};
use crate::host::{FieldHost, SourceTime};
use crate::solver::{EigenmodeSolver, ModeRequest};

pub struct SourceRequest {
    pub component_mask: ComponentMask,
    pub time_profile: SourceTime,
    /// Solve parameters; the target frequency is taken from `time_profile`.
    pub mode: ModeRequest,
    pub amplitude: Complex64,
    pub envelope: Option<Envelope>,
}

impl SourceRequest {
    pub fn new(time_profile: SourceTime, mode: ModeRequest) -> Self {
        Self {
            component_mask: ComponentMask::All,
            time_profile,
            mode,
            amplitude: Complex64::new(1.0, 0.0),
            envelope: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InjectionSummary {
    pub band: usize,
    pub solved_frequency: f64,
    pub wavevector: [f64; 3],
    pub group_velocity: f64,
    pub electric_sources: Vec<Component>,
    pub magnetic_sources: Vec<Component>,
}

/// Solves the requested mode and registers its equivalent currents on
/// `host`. The mode data is released before returning.
pub fn inject<H, S>(
    host: &mut H,
    solver: &EigenmodeSolver<S>,
    request: &SourceRequest,
) -> Result<InjectionSummary, EigenmodeError>
where
    H: FieldHost + ?Sized,
    S: ModeSolverBackend,
{
    let mut mode = request.mode.clone();
    mode.target_frequency = request.time_profile.frequency();
    let data = solver
        .solve(&*host, &mode)?
        .with_envelope(request.envelope.clone());

    let profile = if mode.match_frequency {
        request.time_profile.clone()
    } else {
        request.time_profile.with_frequency(data.solved_frequency())
    };

    let d = mode.direction;
    let dim = host.dimensionality();
    let amp = request.amplitude;
    let admitted = |host: &H, c: Component| {
        host.has_field(c)
            && request.component_mask.admits(c)
            && c.direction() != d
            && (dim != Dimensionality::D2 || mode.parity.admits_2d(c))
    };

    // J = d × H
    let mut electric_sources = Vec::new();
    for c in Component::ELECTRIC {
        if !admitted(&*host, c) {
            continue;
        }
        let Some((axis, sign)) = cross_partner(c.direction(), d) else {
            continue;
        };
        debug!("eigenmode source {c} from h{axis} (scale {})", amp * sign);
        host.add_volume_source(
            c,
            &profile,
            &mode.source_volume,
            &|p| data.amplitude(p, axis),
            amp * sign,
        );
        electric_sources.push(c);
    }

    let data = data.into_electric();

    // K = -d × E
    let mut magnetic_sources = Vec::new();
    for c in Component::MAGNETIC {
        if !admitted(&*host, c) {
            continue;
        }
        let Some((axis, sign)) = cross_partner(c.direction(), d) else {
            continue;
        };
        debug!("eigenmode source {c} from e{axis} (scale {})", -amp * sign);
        host.add_volume_source(
            c,
            &profile,
            &mode.source_volume,
            &|p| data.amplitude(p, axis),
            -amp * sign,
        );
        magnetic_sources.push(c);
    }

    Ok(InjectionSummary {
        band: data.band(),
        solved_frequency: data.solved_frequency(),
        wavevector: data.wavevector(),
        group_velocity: data.group_velocity(),
        electric_sources,
        magnetic_sources,
    })
}
