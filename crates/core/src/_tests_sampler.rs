#![cfg(test)]

use std::sync::Arc;

use num_complex::Complex64;

use super::_tests_support::{approx_eq, unit_cell_2d, MockBackend, RecordingHost, MOCK_H};
use super::geometry::{Dimensionality, Direction, Vec3};
use super::grid::SampleGrid;
use super::sampler::{amplitude, interpolate, lattice_coordinates};
use super::solver::{EigenmodeSolver, ModeRequest};

/// Component `c` of sample `(x, y, z)` encodes its own indices.
fn indexed_samples(grid: &SampleGrid) -> Vec<[Complex64; 3]> {
    let mut samples = vec![[Complex64::new(0.0, 0.0); 3]; grid.len()];
    for x in 0..grid.n[0] {
        for y in 0..grid.n[1] {
            for z in 0..grid.n[2] {
                samples[grid.idx(x, y, z)] = [
                    Complex64::new(x as f64, 0.0),
                    Complex64::new(y as f64, 0.0),
                    Complex64::new(z as f64, (x + y + z) as f64),
                ];
            }
        }
    }
    samples
}

#[test]
fn interpolation_is_exact_at_lattice_points() {
    let grid = SampleGrid::new([4, 2, 8], [1.0, 0.5, 2.0]);
    let samples = indexed_samples(&grid);
    for x in 0..4 {
        for y in 0..2 {
            for z in 0..8 {
                let r = grid.lattice_point(x, y, z);
                for d in Direction::ALL {
                    let got = interpolate(&grid, &samples, r, d);
                    let want = samples[grid.idx(x, y, z)][d.index()];
                    assert!((got - want).norm() < 1e-12, "({x},{y},{z}) {d}: {got} vs {want}");
                }
            }
        }
    }
}

#[test]
fn interpolation_is_linear_between_samples() {
    let grid = SampleGrid::new([4, 1, 1], [1.0, 1.0, 1.0]);
    let samples = indexed_samples(&grid);
    let got = interpolate(&grid, &samples, [0.375, 0.0, 0.0], Direction::X);
    assert!((got - Complex64::new(1.5, 0.0)).norm() < 1e-12);
}

#[test]
fn interpolation_wraps_periodically() {
    let grid = SampleGrid::new([4, 1, 1], [1.0, 1.0, 1.0]);
    let samples = indexed_samples(&grid);

    // Halfway between the last sample and the first one.
    let got = interpolate(&grid, &samples, [0.875, 0.0, 0.0], Direction::X);
    assert!((got - Complex64::new(1.5, 0.0)).norm() < 1e-12);

    for r in [0.125, 0.6, 0.9375] {
        let inside = interpolate(&grid, &samples, [r, 0.0, 0.0], Direction::X);
        let shifted = interpolate(&grid, &samples, [r + 1.0, 0.0, 0.0], Direction::X);
        let negative = interpolate(&grid, &samples, [r - 2.0, 0.0, 0.0], Direction::X);
        assert!((inside - shifted).norm() < 1e-12);
        assert!((inside - negative).norm() < 1e-12);
    }
}

#[test]
fn lattice_coordinates_are_centered_on_the_cell() {
    let grid = SampleGrid::new([8, 4, 1], [2.0, 1.0, 1.0]);
    let center = Vec3::new(0.5, 0.0, 0.0);
    let r = lattice_coordinates(&grid, &center, &Vec3::new(0.5, 0.0, 0.0));
    assert_eq!(r, [0.5, 0.5, 0.5]);
    let r = lattice_coordinates(&grid, &center, &Vec3::new(-0.5, -0.5, 0.0));
    assert_eq!(r, [0.0, 0.0, 0.5]);
}

#[test]
fn amplitude_resolves_points_against_the_domain_center() {
    let grid = SampleGrid::new([4, 2, 1], [2.0, 1.0, 1.0]);
    let samples = indexed_samples(&grid);
    let center = Vec3::new(0.5, 0.0, 0.0);

    let at = |x: f64, axis| amplitude(&grid, &center, &samples, &Vec3::new(x, 0.0, 0.0), axis);
    assert_eq!(at(-0.5, Direction::X).re, 0.0);
    assert_eq!(at(0.5, Direction::X).re, 2.0);
    assert_eq!(at(0.5, Direction::Y).re, 1.0);
}

#[test]
fn mode_amplitude_applies_the_envelope() {
    let host = RecordingHost::new(Dimensionality::D2, 1.0);
    let request = ModeRequest::new(0.5, Direction::Z, unit_cell_2d(), 1);
    let mode = EigenmodeSolver::new(MockBackend)
        .solve(&host, &request)
        .unwrap();

    let p = Vec3::new(0.1, -0.3, 0.0);
    assert!(approx_eq(mode.amplitude(&p, Direction::Y).re, MOCK_H[1], 1e-12));

    let mode = mode.with_envelope(Some(Arc::new(|p: &Vec3| Complex64::new(0.0, p.x))));
    let got = mode.amplitude(&p, Direction::Z);
    assert!((got - Complex64::new(0.0, 0.1 * MOCK_H[2])).norm() < 1e-12);
}
