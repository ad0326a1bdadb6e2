//! Sampled permittivity tensors handed to the eigensolver capability.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Real symmetric 3×3 tensor stored by its six independent components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SymmetricTensor3 {
    pub xx: f64,
    pub yy: f64,
    pub zz: f64,
    pub xy: f64,
    pub xz: f64,
    pub yz: f64,
}

impl SymmetricTensor3 {
    pub fn isotropic(value: f64) -> Self {
        Self {
            xx: value,
            yy: value,
            zz: value,
            xy: 0.0,
            xz: 0.0,
            yz: 0.0,
        }
    }

    /// Components in the order `xx, yy, zz, xy, xz, yz`.
    pub fn components(&self) -> [f64; 6] {
        [self.xx, self.yy, self.zz, self.xy, self.xz, self.yz]
    }

    pub fn determinant(&self) -> f64 {
        self.xx * (self.yy * self.zz - self.yz * self.yz)
            - self.xy * (self.xy * self.zz - self.yz * self.xz)
            + self.xz * (self.xy * self.yz - self.yy * self.xz)
    }

    /// Inverse by cofactors; `None` for (numerically) singular tensors.
    pub fn invert(&self) -> Option<Self> {
        let det = self.determinant();
        let scale = self
            .components()
            .iter()
            .fold(0.0f64, |acc, v| acc.max(v.abs()));
        if !det.is_finite() || det.abs() <= 1e-14 * scale.powi(3) || scale == 0.0 {
            return None;
        }
        let inv_det = 1.0 / det;
        Some(Self {
            xx: (self.yy * self.zz - self.yz * self.yz) * inv_det,
            yy: (self.xx * self.zz - self.xz * self.xz) * inv_det,
            zz: (self.xx * self.yy - self.xy * self.xy) * inv_det,
            xy: (self.xz * self.yz - self.xy * self.zz) * inv_det,
            xz: (self.xy * self.yz - self.xz * self.yy) * inv_det,
            yz: (self.xy * self.xz - self.xx * self.yz) * inv_det,
        })
    }

    /// Sylvester's criterion on the leading principal minors.
    pub fn is_positive_definite(&self) -> bool {
        self.xx > 0.0 && self.xx * self.yy - self.xy * self.xy > 0.0 && self.determinant() > 0.0
    }

    pub fn apply(&self, v: [Complex64; 3]) -> [Complex64; 3] {
        [
            v[0] * self.xx + v[1] * self.xy + v[2] * self.xz,
            v[0] * self.xy + v[1] * self.yy + v[2] * self.yz,
            v[0] * self.xz + v[1] * self.yz + v[2] * self.zz,
        ]
    }
}

/// Permittivity and its inverse at one lattice point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DielectricSample {
    pub eps: SymmetricTensor3,
    pub eps_inv: SymmetricTensor3,
}

impl DielectricSample {
    /// Builds a sample from the host's inverse-permittivity tensor. Returns
    /// `None` when the tensor cannot be inverted.
    pub fn from_inverse(eps_inv: SymmetricTensor3) -> Option<Self> {
        let eps = eps_inv.invert()?;
        Some(Self { eps, eps_inv })
    }

    pub fn isotropic(eps: f64) -> Self {
        Self {
            eps: SymmetricTensor3::isotropic(eps),
            eps_inv: SymmetricTensor3::isotropic(1.0 / eps),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.eps_inv.is_positive_definite() && self.eps.is_positive_definite()
    }
}
