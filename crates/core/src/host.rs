//! Seam to the time-domain field simulation that hosts eigenmode sources.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::geometry::{Component, Dimensionality, Direction, Vec3, Volume};

/// Temporal profile attached to a registered source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceTime {
    Continuous { frequency: f64 },
    Gaussian { frequency: f64, width: f64 },
}

impl SourceTime {
    pub fn frequency(&self) -> f64 {
        match self {
            SourceTime::Continuous { frequency } | SourceTime::Gaussian { frequency, .. } => {
                *frequency
            }
        }
    }

    pub fn with_frequency(&self, frequency: f64) -> Self {
        match self {
            SourceTime::Continuous { .. } => SourceTime::Continuous { frequency },
            SourceTime::Gaussian { width, .. } => SourceTime::Gaussian {
                frequency,
                width: *width,
            },
        }
    }
}

/// Spatial amplitude evaluated by the host at each grid point of a source
/// volume, with the point given relative to the volume center. Borrowed
/// only for the duration of `add_volume_source`.
pub type AmplitudeFn<'a> = dyn Fn(&Vec3) -> Complex64 + 'a;

pub trait FieldHost {
    fn dimensionality(&self) -> Dimensionality;

    /// Grid points per unit length.
    fn resolution(&self) -> f64;

    /// Entry `(component.direction(), direction)` of the inverse
    /// permittivity tensor at `point`.
    fn chi1inv(&self, component: Component, direction: Direction, point: &Vec3) -> f64;

    /// Scalar permittivity at `point`.
    fn eps(&self, point: &Vec3) -> f64;

    fn has_field(&self, component: Component) -> bool;

    /// Registers a current source on `component` over `volume`. The host
    /// calls `amplitude` with each grid point minus `volume.center()` and
    /// multiplies the result by `scale`.
    fn add_volume_source(
        &mut self,
        component: Component,
        time: &SourceTime,
        volume: &Volume,
        amplitude: &AmplitudeFn<'_>,
        scale: Complex64,
    );
}
