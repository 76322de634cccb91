use slidescan_core::config::{step_size, EstimatorMethod, PositionPolicy, SessionConfig};
use slidescan_core::error::SlideScanError;
use slidescan_core::naming::NamingScheme;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

#[test]
fn test_defaults() {
    let config = SessionConfig::default();
    assert_eq!(config.tile_size, 1024);
    assert_eq!(config.overlap_fraction, 0.1);
    assert_eq!(config.step_size(), 921);
    assert_eq!(config.capture_quality, 95);
    assert_eq!(config.naming, NamingScheme::Index);
    assert_eq!(config.position_policy, PositionPolicy::Truncate);
    assert_eq!(config.estimator.method, EstimatorMethod::Features);
    assert_eq!(config.pyramid.levels, 7);
    assert_eq!(config.pyramid.quality, 90);
    assert_eq!(config.reconstruct.hard_ceiling_mb, 15000.0);
    assert_eq!(config.reconstruct.max_dimension, 60_000);
    assert!(config.validate().is_ok());
}

#[test]
fn test_step_size_truncates() {
    assert_eq!(step_size(1024, 0.0), 1024);
    assert_eq!(step_size(100, 0.25), 75);
    assert_eq!(step_size(10, 0.95), 0);
}

#[test]
fn test_display_names() {
    assert_eq!(EstimatorMethod::Features.to_string(), "Features (FAST + BRIEF)");
    assert_eq!(EstimatorMethod::PhaseCorrelation.to_string(), "Phase Correlation");
    assert_eq!(PositionPolicy::Round.to_string(), "Round");
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn rejected(config: SessionConfig) -> bool {
    matches!(config.validate(), Err(SlideScanError::InvalidConfig(_)))
}

#[test]
fn test_invalid_values_are_rejected() {
    assert!(rejected(SessionConfig {
        tile_size: 0,
        ..Default::default()
    }));
    assert!(rejected(SessionConfig {
        overlap_fraction: 1.0,
        ..Default::default()
    }));
    assert!(rejected(SessionConfig {
        overlap_fraction: -0.1,
        ..Default::default()
    }));
    assert!(rejected(SessionConfig {
        tile_size: 10,
        overlap_fraction: 0.95,
        ..Default::default()
    }));

    let mut config = SessionConfig::default();
    config.pyramid.levels = 8;
    assert!(rejected(config));

    let mut config = SessionConfig::default();
    config.estimator.best_matches = 0;
    assert!(rejected(config));

    let mut config = SessionConfig::default();
    config.estimator.min_keypoints = 9;
    assert!(rejected(config));

    let mut config = SessionConfig::default();
    config.estimator.min_keypoints = 25;
    assert!(config.validate().is_ok());

    let mut config = SessionConfig::default();
    config.reconstruct.soft_ceiling_mb = 20_000.0;
    assert!(rejected(config));
}

// ---------------------------------------------------------------------------
// TOML
// ---------------------------------------------------------------------------

#[test]
fn test_toml_round_trip() {
    let mut config = SessionConfig {
        tile_size: 512,
        naming: NamingScheme::Grid,
        ..Default::default()
    };
    config.estimator.method = EstimatorMethod::PhaseCorrelation;

    let text = toml::to_string(&config).unwrap();
    let back: SessionConfig = toml::from_str(&text).unwrap();
    assert_eq!(back.tile_size, 512);
    assert_eq!(back.naming, NamingScheme::Grid);
    assert_eq!(back.estimator.method, EstimatorMethod::PhaseCorrelation);
    assert_eq!(back.step_size(), config.step_size());
}

#[test]
fn test_partial_toml_uses_defaults() {
    let text = r#"
        output = "slide_42"
        overlap_fraction = 0.25

        [pyramid]
        levels = 4
    "#;
    let config: SessionConfig = toml::from_str(text).unwrap();
    assert_eq!(config.output.to_str(), Some("slide_42"));
    assert_eq!(config.tile_size, 1024);
    assert_eq!(config.step_size(), 768);
    assert_eq!(config.pyramid.levels, 4);
    assert_eq!(config.pyramid.quality, 90);
    assert_eq!(config.reconstruct.min_success_rate, 0.9);
}
