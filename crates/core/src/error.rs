//! Error classes surfaced by eigenmode solves, injection and projection.

use thiserror::Error;

use crate::collective::CollectiveError;

/// Every variant except `Collective` is raised identically on all
/// processes, since each process runs the same replicated solve.
#[derive(Debug, Error)]
pub enum EigenmodeError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid geometry: {0}")]
    Geometry(String),

    #[error("invalid dielectric: {0}")]
    InvalidDielectric(String),

    #[error("Newton solver not converging: {0}")]
    Convergence(String),

    #[error(transparent)]
    Collective(#[from] CollectiveError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("flux snapshot serialization failed: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Config(#[from] toml::de::Error),
}
