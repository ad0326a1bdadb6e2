#![cfg(test)]

use num_complex::Complex64;

use super::dielectric::{DielectricSample, SymmetricTensor3};

fn anisotropic() -> SymmetricTensor3 {
    SymmetricTensor3 {
        xx: 4.0,
        yy: 3.0,
        zz: 2.0,
        xy: 0.5,
        xz: -0.25,
        yz: 0.1,
    }
}

#[test]
fn inverse_times_tensor_is_identity() {
    let t = anisotropic();
    let inv = t.invert().expect("tensor is invertible");
    for (axis, unit) in [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]].iter().enumerate() {
        let v = unit.map(|c| Complex64::new(c, 0.0));
        let back = inv.apply(t.apply(v));
        for i in 0..3 {
            let expected = if i == axis { 1.0 } else { 0.0 };
            assert!((back[i] - Complex64::new(expected, 0.0)).norm() < 1e-12);
        }
    }
}

#[test]
fn singular_tensor_has_no_inverse() {
    let mut t = SymmetricTensor3::isotropic(1.0);
    t.zz = 0.0;
    assert!(t.invert().is_none());
    assert!(SymmetricTensor3::isotropic(0.0).invert().is_none());
}

#[test]
fn positive_definiteness_uses_all_minors() {
    assert!(anisotropic().is_positive_definite());
    assert!(!SymmetricTensor3::isotropic(-1.0).is_positive_definite());
    let mut indefinite = SymmetricTensor3::isotropic(1.0);
    indefinite.xy = 2.0;
    assert!(!indefinite.is_positive_definite());
}

#[test]
fn samples_from_inverse_tensor() {
    let sample = DielectricSample::from_inverse(SymmetricTensor3::isotropic(0.25)).unwrap();
    assert!((sample.eps.xx - 4.0).abs() < 1e-12);
    assert!(sample.is_valid());
    let negative = DielectricSample::from_inverse(SymmetricTensor3::isotropic(-0.5)).unwrap();
    assert!(!negative.is_valid());
}
