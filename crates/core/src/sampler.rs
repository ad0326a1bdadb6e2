//! Periodic trilinear interpolation of sampled mode fields.

use num_complex::Complex64;

use crate::geometry::{Direction, Vec3};
use crate::grid::SampleGrid;

/// Interpolates component `axis` of `samples` at lattice coordinates `r`
/// (one cell per unit, periodic in every axis).
pub fn interpolate(
    grid: &SampleGrid,
    samples: &[[Complex64; 3]],
    r: [f64; 3],
    axis: Direction,
) -> Complex64 {
    let mut lo = [0usize; 3];
    let mut hi = [0usize; 3];
    let mut frac = [0.0; 3];
    for i in 0..3 {
        let n = grid.n[i] as i64;
        let t = r[i] * grid.n[i] as f64;
        let base = t.floor();
        frac[i] = t - base;
        let base = base as i64;
        lo[i] = base.rem_euclid(n) as usize;
        hi[i] = (base + 1).rem_euclid(n) as usize;
    }

    let c = axis.index();
    let at = |x: usize, y: usize, z: usize| samples[grid.idx(x, y, z)][c];
    let (dx, dy, dz) = (frac[0], frac[1], frac[2]);

    at(lo[0], lo[1], lo[2]) * ((1.0 - dx) * (1.0 - dy) * (1.0 - dz))
        + at(lo[0], lo[1], hi[2]) * ((1.0 - dx) * (1.0 - dy) * dz)
        + at(lo[0], hi[1], lo[2]) * ((1.0 - dx) * dy * (1.0 - dz))
        + at(lo[0], hi[1], hi[2]) * ((1.0 - dx) * dy * dz)
        + at(hi[0], lo[1], lo[2]) * (dx * (1.0 - dy) * (1.0 - dz))
        + at(hi[0], lo[1], hi[2]) * (dx * (1.0 - dy) * dz)
        + at(hi[0], hi[1], lo[2]) * (dx * dy * (1.0 - dz))
        + at(hi[0], hi[1], hi[2]) * (dx * dy * dz)
}

/// Lattice coordinates of a point given relative to the source volume
/// center. `domain_center` is the offset of the cell center from that
/// center; the cell spans `[-s/2, s/2)` around its own center.
pub fn lattice_coordinates(grid: &SampleGrid, domain_center: &Vec3, point: &Vec3) -> [f64; 3] {
    let mut r = [0.0; 3];
    for d in Direction::ALL {
        let i = d.index();
        r[i] = (point.in_direction(d) - domain_center.in_direction(d)) / grid.s[i] + 0.5;
    }
    r
}

/// Interpolated component `axis` at `point`, given relative to the source
/// volume center.
pub fn amplitude(
    grid: &SampleGrid,
    domain_center: &Vec3,
    samples: &[[Complex64; 3]],
    point: &Vec3,
    axis: Direction,
) -> Complex64 {
    interpolate(grid, samples, lattice_coordinates(grid, domain_center, point), axis)
}
