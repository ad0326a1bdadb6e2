#![cfg(test)]

use num_complex::Complex64;

use super::_tests_support::{approx_eq, MockBackend, RecordingHost, MOCK_H, MOCK_QXH};
use super::error::EigenmodeError;
use super::geometry::{Component, ComponentMask, Dimensionality, Direction, Vec3, Volume};
use super::host::SourceTime;
use super::injector::{inject, SourceRequest};
use super::parity::Parity;
use super::solver::{EigenmodeSolver, ModeRequest};

fn plane_normal_z() -> Volume {
    Volume::new(
        Dimensionality::D3,
        Vec3::new(-0.5, -0.5, 0.0),
        Vec3::new(0.5, 0.5, 0.0),
    )
}

fn request(frequency: f64, direction: Direction, volume: Volume) -> SourceRequest {
    SourceRequest::new(
        SourceTime::Continuous { frequency },
        ModeRequest::new(f64::NAN, direction, volume, 1),
    )
}

fn recorded(host: &RecordingHost, c: Component) -> (Complex64, Complex64) {
    let source = host
        .sources
        .iter()
        .find(|s| s.component == c)
        .unwrap_or_else(|| panic!("no source registered for {c}"));
    (source.scale, source.sample)
}

#[test]
fn equivalent_currents_use_cyclic_signs() {
    let mut host = RecordingHost::new(Dimensionality::D3, 1.0);
    let solver = EigenmodeSolver::new(MockBackend);
    let summary = inject(&mut host, &solver, &request(0.5, Direction::Z, plane_normal_z())).unwrap();

    assert_eq!(summary.electric_sources, vec![Component::Ex, Component::Ey]);
    assert_eq!(summary.magnetic_sources, vec![Component::Hx, Component::Hy]);
    assert!(approx_eq(summary.solved_frequency, 0.5, 1e-12));

    // J = z × H: Jx = -Hy, Jy = Hx.
    let (scale, sample) = recorded(&host, Component::Ex);
    assert_eq!(scale, Complex64::new(-1.0, 0.0));
    assert!(approx_eq(sample.re, MOCK_H[1], 1e-12));
    let (scale, sample) = recorded(&host, Component::Ey);
    assert_eq!(scale, Complex64::new(1.0, 0.0));
    assert!(approx_eq(sample.re, MOCK_H[0], 1e-12));

    // K = -z × E with E = -(q × h) / ω in vacuum: Kx = Ey, Ky = -Ex.
    let e = MOCK_QXH.map(|v| -v / 0.5);
    let (scale, sample) = recorded(&host, Component::Hx);
    assert_eq!(scale, Complex64::new(1.0, 0.0));
    assert!(approx_eq(sample.re, e[1], 1e-12));
    let (scale, sample) = recorded(&host, Component::Hy);
    assert_eq!(scale, Complex64::new(-1.0, 0.0));
    assert!(approx_eq(sample.re, e[0], 1e-12));
}

#[test]
fn amplitude_scales_every_source() {
    let mut host = RecordingHost::new(Dimensionality::D3, 1.0);
    let solver = EigenmodeSolver::new(MockBackend);
    let mut req = request(0.5, Direction::Z, plane_normal_z());
    req.amplitude = Complex64::new(0.0, 2.0);
    inject(&mut host, &solver, &req).unwrap();
    assert_eq!(recorded(&host, Component::Ex).0, Complex64::new(0.0, -2.0));
    assert_eq!(recorded(&host, Component::Hx).0, Complex64::new(0.0, 2.0));
}

#[test]
fn mask_selects_a_single_component() {
    let mut host = RecordingHost::new(Dimensionality::D3, 1.0);
    let solver = EigenmodeSolver::new(MockBackend);
    let mut req = request(0.5, Direction::Z, plane_normal_z());
    req.component_mask = ComponentMask::Only(Component::Dy);
    let summary = inject(&mut host, &solver, &req).unwrap();
    assert_eq!(summary.electric_sources, vec![Component::Ey]);
    assert!(summary.magnetic_sources.is_empty());
    assert_eq!(host.sources.len(), 1);
}

#[test]
fn two_dimensional_parity_filters_components() {
    let line = Volume::new(
        Dimensionality::D2,
        Vec3::new(0.0, -0.5, 0.0),
        Vec3::new(0.0, 0.5, 0.0),
    );
    let solver = EigenmodeSolver::new(MockBackend);

    let mut host = RecordingHost::new(Dimensionality::D2, 1.0);
    let mut req = request(0.5, Direction::X, line);
    req.mode.parity = Parity::EvenZ;
    let summary = inject(&mut host, &solver, &req).unwrap();
    assert_eq!(summary.electric_sources, vec![Component::Ey]);
    assert_eq!(summary.magnetic_sources, vec![Component::Hz]);

    let mut host = RecordingHost::new(Dimensionality::D2, 1.0);
    req.mode.parity = Parity::OddZ;
    let summary = inject(&mut host, &solver, &req).unwrap();
    assert_eq!(summary.electric_sources, vec![Component::Ez]);
    assert_eq!(summary.magnetic_sources, vec![Component::Hy]);
}

#[test]
fn components_missing_on_the_host_are_skipped() {
    let mut host = RecordingHost::new(Dimensionality::D1, 1.0);
    host.fields = vec![Component::Ex, Component::Hy];
    let point = Volume::new(Dimensionality::D1, Vec3::ZERO, Vec3::ZERO);
    let solver = EigenmodeSolver::new(MockBackend);
    let summary = inject(&mut host, &solver, &request(0.5, Direction::Z, point)).unwrap();
    assert_eq!(summary.electric_sources, vec![Component::Ex]);
    assert_eq!(summary.magnetic_sources, vec![Component::Hy]);
}

#[test]
fn unmatched_sources_run_at_the_solved_frequency() {
    let mut host = RecordingHost::new(Dimensionality::D3, 1.0);
    let solver = EigenmodeSolver::new(MockBackend);
    let mut req = request(0.5, Direction::Z, plane_normal_z());
    req.time_profile = SourceTime::Gaussian {
        frequency: 0.5,
        width: 3.0,
    };
    req.mode.match_frequency = false;
    req.mode.wavevector_guess = Vec3::new(0.0, 0.0, 0.8);
    let summary = inject(&mut host, &solver, &req).unwrap();
    assert!(approx_eq(summary.solved_frequency, 0.8, 1e-12));
    for source in &host.sources {
        match source.time {
            SourceTime::Gaussian { frequency, width } => {
                assert!(approx_eq(frequency, 0.8, 1e-12));
                assert_eq!(width, 3.0);
            }
            SourceTime::Continuous { .. } => panic!("time profile kind changed"),
        }
    }
}

#[test]
fn failed_solve_registers_nothing() {
    let mut host = RecordingHost::new(Dimensionality::D3, 1.0);
    let solver = EigenmodeSolver::<MockBackend>::unavailable();
    let err = inject(&mut host, &solver, &request(0.5, Direction::Z, plane_normal_z())).unwrap_err();
    assert!(matches!(err, EigenmodeError::Configuration(_)));
    assert!(host.sources.is_empty());
}
