#![cfg(test)]

use super::error::EigenmodeError;
use super::io::EigenmodeConfig;
use super::parity::Parity;

#[test]
fn empty_config_uses_defaults() {
    let config = EigenmodeConfig::from_toml_str("").unwrap();
    assert_eq!(config, EigenmodeConfig::default());
    assert_eq!(config.brillouin_clamp, 0.4);
    assert_eq!(config.newton_scale_bounds, [0.0, 100.0]);
    assert_eq!(config.max_newton_iterations, 50);
}

#[test]
fn partial_config_overrides_selected_keys() {
    let config = EigenmodeConfig::from_toml_str(
        r#"
        max_newton_iterations = 12
        projection_tolerance = 1e-9
        default_parity = "tm"
        "#,
    )
    .unwrap();
    assert_eq!(config.max_newton_iterations, 12);
    assert_eq!(config.projection_tolerance, 1e-9);
    assert_eq!(config.default_parity, Parity::OddZ);
    assert_eq!(config.match_tolerance_factor, 10.0);
}

#[test]
fn parity_accepts_canonical_names() {
    let config = EigenmodeConfig::from_toml_str("default_parity = \"even_z\"").unwrap();
    assert_eq!(config.default_parity, Parity::EvenZ);
}

#[test]
fn malformed_toml_is_reported() {
    let err = EigenmodeConfig::from_toml_str("max_newton_iterations = \"many\"").unwrap_err();
    assert!(matches!(err, EigenmodeError::Config(_)));
}

#[test]
fn inverted_scale_bounds_are_rejected() {
    let err = EigenmodeConfig::from_toml_str("newton_scale_bounds = [5.0, 1.0]").unwrap_err();
    assert!(matches!(err, EigenmodeError::Configuration(_)));
    assert_eq!(
        err.to_string(),
        "configuration error: newton_scale_bounds must be increasing, got [5, 1]"
    );
}
