//! Periodic sample grids spanning the eigenmode computational cell.

use serde::{Deserialize, Serialize};

/// Sample counts `n` and cell extents `s` along x, y, z. Samples are stored
/// row-major with z fastest: `(ix * ny + iy) * nz + iz`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleGrid {
    pub n: [usize; 3],
    #[serde(default = "default_extent")]
    pub s: [f64; 3],
}

impl SampleGrid {
    pub fn new(n: [usize; 3], s: [f64; 3]) -> Self {
        Self { n, s }
    }

    /// Builds the grid for a cell of the given extents at `resolution`
    /// samples per unit length. Zero extents collapse to a single sample of
    /// unit length.
    pub fn from_extents(extents: [f64; 3], resolution: f64) -> Self {
        let mut n = [1usize; 3];
        let mut s = [1.0; 3];
        for axis in 0..3 {
            let extent = extents[axis].abs();
            if extent > 0.0 {
                s[axis] = extent;
                n[axis] = ((resolution * extent).round() as usize).max(1);
            }
        }
        Self { n, s }
    }

    #[inline]
    pub fn idx(&self, ix: usize, iy: usize, iz: usize) -> usize {
        (ix * self.n[1] + iy) * self.n[2] + iz
    }

    pub fn len(&self) -> usize {
        self.n[0] * self.n[1] * self.n[2]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lattice coordinates in `[0, 1)` of the sample at `(ix, iy, iz)`.
    pub fn lattice_point(&self, ix: usize, iy: usize, iz: usize) -> [f64; 3] {
        [
            ix as f64 / self.n[0] as f64,
            iy as f64 / self.n[1] as f64,
            iz as f64 / self.n[2] as f64,
        ]
    }

    /// Reciprocal basis rows `G_j = e_j / s_j` (no 2π factor).
    pub fn reciprocal_basis(&self) -> [[f64; 3]; 3] {
        let mut g = [[0.0; 3]; 3];
        for axis in 0..3 {
            g[axis][axis] = 1.0 / self.s[axis];
        }
        g
    }

    /// Cartesian wavevector for lattice coordinates `k`.
    pub fn to_cartesian(&self, k: [f64; 3]) -> [f64; 3] {
        [k[0] / self.s[0], k[1] / self.s[1], k[2] / self.s[2]]
    }
}

fn default_extent() -> [f64; 3] {
    [1.0; 3]
}
