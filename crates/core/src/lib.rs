//! Eigenmode sources and mode-expansion coefficients for time-domain
//! electromagnetic simulations.

pub mod backend;
pub mod collective;
pub mod dielectric;
pub mod eigenmode;
pub mod error;
pub mod flux;
pub mod geometry;
pub mod grid;
pub mod host;
pub mod injector;
pub mod io;
pub mod parity;
pub mod phase;
pub mod projector;
pub mod sampler;
pub mod solver;

pub use eigenmode::{EigenmodeData, Electric, Magnetic};
pub use error::EigenmodeError;
pub use solver::{EigenmodeSolver, ModeRequest};


#[cfg(test)]
mod _tests_dielectric;
#[cfg(test)]
mod _tests_injector;
#[cfg(test)]
mod _tests_io;
#[cfg(test)]
mod _tests_projector;
#[cfg(test)]
mod _tests_sampler;
