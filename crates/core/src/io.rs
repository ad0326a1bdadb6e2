//! Configuration file parsing.
//!
//! Tunables of the eigenmode solver and projector, loadable from TOML. Every
//! key is optional; missing keys fall back to the defaults below.
//!
//! # File Format
//!
//! ```toml
//! brillouin_clamp = 0.4
//! newton_scale_bounds = [0.0, 100.0]
//! max_newton_iterations = 50
//! match_tolerance_factor = 10.0
//! projection_tolerance = 1e-7
//! default_parity = "none"   # or "even_z" / "te", "odd_z" / "tm"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::EigenmodeError;
use crate::parity::Parity;

// ============================================================================
// Solver Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EigenmodeConfig {
    /// Bound on each seeded wavevector component, in reciprocal-lattice units.
    pub brillouin_clamp: f64,
    /// Allowed range of the Newton wavevector scale factor.
    pub newton_scale_bounds: [f64; 2],
    pub max_newton_iterations: usize,
    /// Newton stops once `|ω - target| <= factor * tolerance * target`.
    pub match_tolerance_factor: f64,
    /// Eigensolver tolerance used when projecting flux onto modes.
    pub projection_tolerance: f64,
    pub default_parity: Parity,
}

impl Default for EigenmodeConfig {
    fn default() -> Self {
        Self {
            brillouin_clamp: 0.4,
            newton_scale_bounds: [0.0, 100.0],
            max_newton_iterations: 50,
            match_tolerance_factor: 10.0,
            projection_tolerance: 1e-7,
            default_parity: Parity::None,
        }
    }
}

impl EigenmodeConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, EigenmodeError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, EigenmodeError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), EigenmodeError> {
        let [lo, hi] = self.newton_scale_bounds;
        if !(lo < hi) {
            return Err(EigenmodeError::Configuration(format!(
                "newton_scale_bounds must be increasing, got [{lo}, {hi}]"
            )));
        }
        if !(self.brillouin_clamp > 0.0) {
            return Err(EigenmodeError::Configuration(format!(
                "brillouin_clamp must be positive, got {}",
                self.brillouin_clamp
            )));
        }
        if self.max_newton_iterations == 0 {
            return Err(EigenmodeError::Configuration(
                "max_newton_iterations must be at least 1".into(),
            ));
        }
        if !(self.match_tolerance_factor > 0.0) || !(self.projection_tolerance > 0.0) {
            return Err(EigenmodeError::Configuration(
                "tolerances must be positive".into(),
            ));
        }
        Ok(())
    }
}
