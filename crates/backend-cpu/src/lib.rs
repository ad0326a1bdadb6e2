//! Dense plane-wave eigensolver backend built on rustfft.
//!
//! Suitable for the small cross-sections eigenmode sources and flux planes
//! usually span; the Jacobi eigensolve is cubic in the number of plane
//! waves, i.e. twice the number of grid samples.

pub mod fft;
pub mod jacobi;
pub mod workspace;

use log::debug;

use eigenmode_core::backend::{ModeSolverBackend, ModeWorkspace};
use eigenmode_core::error::EigenmodeError;
use eigenmode_core::grid::SampleGrid;

pub use workspace::PlaneWaveWorkspace;

/// Sample grids above this size are rejected instead of assembling a
/// dense matrix that cannot fit in memory.
const MAX_GRID_SAMPLES: usize = 1024;

#[derive(Debug, Clone)]
pub struct PlaneWaveBackend {
    max_sweeps: usize,
    max_samples: usize,
}

impl Default for PlaneWaveBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaneWaveBackend {
    pub fn new() -> Self {
        Self {
            max_sweeps: 100,
            max_samples: MAX_GRID_SAMPLES,
        }
    }

    pub fn with_max_sweeps(mut self, max_sweeps: usize) -> Self {
        self.max_sweeps = max_sweeps.max(1);
        self
    }

    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples;
        self
    }
}

impl ModeSolverBackend for PlaneWaveBackend {
    fn create_workspace(
        &self,
        grid: SampleGrid,
        num_bands: usize,
    ) -> Result<Box<dyn ModeWorkspace>, EigenmodeError> {
        if grid.len() > self.max_samples {
            return Err(EigenmodeError::Geometry(format!(
                "{}x{}x{} sample grid exceeds the dense plane-wave limit of {} samples; \
                 set ModeRequest::resolution below its default of twice the host resolution \
                 or raise the limit with PlaneWaveBackend::with_max_samples",
                grid.n[0], grid.n[1], grid.n[2], self.max_samples
            )));
        }
        debug!(
            "allocating plane-wave workspace {}x{}x{} for {num_bands} bands",
            grid.n[0], grid.n[1], grid.n[2]
        );
        Ok(Box::new(PlaneWaveWorkspace::new(grid, self.max_sweeps)))
    }

    fn name(&self) -> &'static str {
        "plane-wave"
    }
}
