#![cfg(test)]

use std::thread;
use std::time::Duration;

use num_complex::Complex64;

use super::_tests_support::{approx_eq, unit_cell_2d, MockBackend, RecordingHost, MOCK_H, MOCK_QXH};
use super::collective::{Collective, CollectiveError, LocalProcessGroup, SingleProcess};
use super::error::EigenmodeError;
use super::flux::{ChunkTransform, FluxChunk, FluxPoint, FluxRecord, FluxSnapshot};
use super::geometry::{Component, Dimensionality, Direction, Vec3};
use super::projector::ModeProjector;
use super::solver::EigenmodeSolver;

fn c(re: f64) -> Complex64 {
    Complex64::new(re, 0.0)
}

/// One chunk per component, each holding the given value at `points`.
fn record(values: &[(Component, f64)], points: &[Vec3]) -> FluxRecord {
    FluxRecord {
        freq_min: 0.5,
        dfreq: 0.1,
        num_freqs: 1,
        chunks: values
            .iter()
            .map(|&(component, value)| FluxChunk {
                component,
                transform: ChunkTransform::identity(),
                points: points
                    .iter()
                    .map(|&position| FluxPoint { position, weight: 0.25 })
                    .collect(),
                values: vec![vec![c(value); points.len()]],
            })
            .collect(),
    }
}

fn snapshot(values: &[(Component, f64)], points: &[Vec3]) -> FluxSnapshot {
    FluxSnapshot::capture(&record(values, points), &unit_cell_2d()).unwrap()
}

fn four_points() -> Vec<Vec3> {
    vec![
        Vec3::new(-0.25, -0.25, 0.0),
        Vec3::new(0.25, -0.25, 0.0),
        Vec3::new(-0.25, 0.25, 0.0),
        Vec3::new(0.25, 0.25, 0.0),
    ]
}

#[test]
fn electric_flux_pairs_with_the_mode_magnetic_field() {
    let host = RecordingHost::new(Dimensionality::D2, 1.0);
    let solver = EigenmodeSolver::new(MockBackend);
    let projector = ModeProjector::new(&solver);

    let snap = snapshot(&[(Component::Ex, 1.0)], &four_points());
    let coef = projector
        .coefficient(&host, &SingleProcess, &snap, 0, Direction::Z, 1, None)
        .unwrap();
    // Ex = d+1 overlaps -Hy.
    assert!(approx_eq(coef.value.re, -MOCK_H[1], 1e-12));
    assert!(coef.value.im.abs() < 1e-12);
    assert!(approx_eq(coef.group_velocity, 1.0, 1e-12));

    let snap = snapshot(&[(Component::Ey, 2.0)], &four_points());
    let coef = projector
        .coefficient(&host, &SingleProcess, &snap, 0, Direction::Z, 1, None)
        .unwrap();
    // Ey = d+2 overlaps +Hx, normalized by |F|² = 4.
    assert!(approx_eq(coef.value.re, 2.0 * MOCK_H[0] / 4.0, 1e-12));
}

#[test]
fn magnetic_flux_pairs_with_the_mode_electric_field() {
    let host = RecordingHost::new(Dimensionality::D2, 1.0);
    let solver = EigenmodeSolver::new(MockBackend);
    let projector = ModeProjector::new(&solver);
    let e = MOCK_QXH.map(|v| -v / 0.5);

    let snap = snapshot(&[(Component::Hx, 1.0)], &four_points());
    let coef = projector
        .coefficient(&host, &SingleProcess, &snap, 0, Direction::Z, 1, None)
        .unwrap();
    assert!(approx_eq(coef.value.re, e[1], 1e-12));

    let snap = snapshot(&[(Component::By, 1.0)], &four_points());
    let coef = projector
        .coefficient(&host, &SingleProcess, &snap, 0, Direction::Z, 1, None)
        .unwrap();
    assert!(approx_eq(coef.value.re, -e[0], 1e-12));
}

#[test]
fn coefficient_scales_inversely_with_flux_amplitude() {
    let host = RecordingHost::new(Dimensionality::D2, 1.0);
    let solver = EigenmodeSolver::new(MockBackend);
    let projector = ModeProjector::new(&solver);
    let fields = |a: f64| [(Component::Ex, a), (Component::Hy, -0.5 * a), (Component::Ey, 0.3 * a)];

    let one = snapshot(&fields(1.0), &four_points());
    let three = snapshot(&fields(3.0), &four_points());
    let a = projector
        .coefficient(&host, &SingleProcess, &one, 0, Direction::Z, 1, None)
        .unwrap();
    let b = projector
        .coefficient(&host, &SingleProcess, &three, 0, Direction::Z, 1, None)
        .unwrap();
    assert!((a.value - b.value * 3.0).norm() < 1e-12);
}

#[test]
fn vanishing_flux_gives_a_zero_coefficient() {
    let host = RecordingHost::new(Dimensionality::D2, 1.0);
    let solver = EigenmodeSolver::new(MockBackend);
    let projector = ModeProjector::new(&solver);
    let snap = snapshot(&[(Component::Ex, 0.0), (Component::Hy, 0.0)], &four_points());
    let coef = projector
        .coefficient(&host, &SingleProcess, &snap, 0, Direction::Z, 1, None)
        .unwrap();
    assert_eq!(coef.value, c(0.0));
}

#[test]
fn wavevector_guess_is_forwarded() {
    let host = RecordingHost::new(Dimensionality::D2, 1.0);
    let solver = EigenmodeSolver::new(MockBackend);
    let projector = ModeProjector::new(&solver);
    let guess = |f: f64, band: usize| Vec3::new(0.0, 0.0, f * band as f64);
    let request = projector.mode_request(&host, 0.7, Direction::Z, &unit_cell_2d(), 2, Some(&guess));
    assert_eq!(request.wavevector_guess, Vec3::new(0.0, 0.0, 1.4));
    assert_eq!(request.resolution, host.resolution);
    assert!(request.match_frequency);
    assert_eq!(request.tolerance, 1e-7);
}

#[test]
fn coefficients_cover_every_band_and_frequency() {
    let host = RecordingHost::new(Dimensionality::D2, 1.0);
    let solver = EigenmodeSolver::new(MockBackend);
    let projector = ModeProjector::new(&solver);
    let mut rec = record(&[(Component::Ex, 1.0)], &four_points());
    // Band 2 of the mock only exists above frequency 1.
    rec.freq_min = 1.5;
    rec.num_freqs = 2;
    rec.chunks[0].values.push(vec![c(2.0); 4]);

    let result = projector
        .coefficients(&host, &SingleProcess, &rec, Direction::Z, &unit_cell_2d(), &[1, 2], None)
        .unwrap();
    assert_eq!(result.bands, vec![1, 2]);
    assert_eq!(result.values.len(), 2);
    assert!(result.values.iter().all(|row| row.len() == 2));
    assert!(approx_eq(result.frequencies[1], 1.6, 1e-12));
    assert!(approx_eq(result.values[0][1].re, -MOCK_H[1] / 2.0, 1e-12));
    // Band 2 sits at sqrt(k² + 1) and has a slower group velocity.
    assert!(result.group_velocities[1][1] < result.group_velocities[0][1]);
}

#[test]
fn frequency_index_out_of_range_is_rejected() {
    let host = RecordingHost::new(Dimensionality::D2, 1.0);
    let solver = EigenmodeSolver::new(MockBackend);
    let projector = ModeProjector::new(&solver);
    let snap = snapshot(&[(Component::Ex, 1.0)], &four_points());
    let err = projector
        .coefficient(&host, &SingleProcess, &snap, 3, Direction::Z, 1, None)
        .unwrap_err();
    assert!(matches!(err, EigenmodeError::Geometry(_)));
}

#[test]
fn snapshot_missing_frequency_rows_is_rejected() {
    let host = RecordingHost::new(Dimensionality::D2, 1.0);
    let solver = EigenmodeSolver::new(MockBackend);
    let projector = ModeProjector::new(&solver);
    let mut snap = snapshot(&[(Component::Ex, 1.0)], &four_points());
    snap.num_freqs = 2;
    let err = projector
        .coefficient(&host, &SingleProcess, &snap, 1, Direction::Z, 1, None)
        .unwrap_err();
    assert!(matches!(err, EigenmodeError::Geometry(_)), "{err}");
}

#[test]
fn distributed_points_reduce_to_the_single_process_value() {
    let fields = [(Component::Ex, 1.0), (Component::Hy, 0.4), (Component::Ey, -0.2)];
    let points = four_points();
    let expected = {
        let host = RecordingHost::new(Dimensionality::D2, 1.0);
        let solver = EigenmodeSolver::new(MockBackend);
        ModeProjector::new(&solver)
            .coefficient(&host, &SingleProcess, &snapshot(&fields, &points), 0, Direction::Z, 1, None)
            .unwrap()
            .value
    };

    let group = LocalProcessGroup::create(2, Some(Duration::from_secs(30)));
    let values: Vec<Complex64> = thread::scope(|scope| {
        let handles: Vec<_> = group
            .into_iter()
            .map(|comm| {
                let local = points[comm.rank() * 2..comm.rank() * 2 + 2].to_vec();
                scope.spawn(move || {
                    let host = RecordingHost::new(Dimensionality::D2, 1.0);
                    let solver = EigenmodeSolver::new(MockBackend);
                    ModeProjector::new(&solver)
                        .coefficient(&host, &comm, &snapshot(&fields, &local), 0, Direction::Z, 1, None)
                        .unwrap()
                        .value
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for value in values {
        assert!((value - expected).norm() < 1e-12);
    }
}

#[test]
fn unequal_call_counts_are_detected() {
    let mut group = LocalProcessGroup::create(2, Some(Duration::from_secs(30)));
    let short = group.pop().unwrap();
    let long = group.pop().unwrap();
    let snap = snapshot(&[(Component::Ex, 1.0)], &four_points());

    let err = thread::scope(|scope| {
        let snap_ref = &snap;
        scope.spawn(move || {
            let host = RecordingHost::new(Dimensionality::D2, 1.0);
            let solver = EigenmodeSolver::new(MockBackend);
            ModeProjector::new(&solver)
                .coefficient(&host, &short, snap_ref, 0, Direction::Z, 1, None)
                .unwrap();
        });
        let host = RecordingHost::new(Dimensionality::D2, 1.0);
        let solver = EigenmodeSolver::new(MockBackend);
        let projector = ModeProjector::new(&solver);
        projector
            .coefficient(&host, &long, &snap, 0, Direction::Z, 1, None)
            .unwrap();
        projector
            .coefficient(&host, &long, &snap, 0, Direction::Z, 1, None)
            .unwrap_err()
    });
    assert!(
        matches!(err, EigenmodeError::Collective(CollectiveError::PeerExited { peer: 1, .. })),
        "{err}"
    );
}
