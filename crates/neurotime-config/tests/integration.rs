//! Integration tests for neurotime-config.
//!
//! These tests verify file round trips and that loaded settings drive the
//! analyzers.

use neurotime_analysis::{CoherenceAnalyzer, EventRelatedAnalyzer, FilterAnalyzer};
use neurotime_config::{AnalysisConfig, ConfigError, ValidationError};
use neurotime_core::TimeSeries;
use tempfile::TempDir;

const DOCUMENT: &str = r#"
sampling_interval = 0.01

[event_related]
window_len = 8
offset = -2

[coherence]
segment_len = 32
overlap = 16
window = "hamming"

[filter]
ub = 20.0
"#;

/// Test saving to a nested path and loading it back.
#[test]
fn test_save_and_load_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("analysis.toml");

    let config = AnalysisConfig::from_toml(DOCUMENT).unwrap();
    config.save(&path).unwrap();
    assert!(path.is_file());

    let loaded = AnalysisConfig::load_validated(&path).unwrap();
    assert_eq!(loaded, config);
}

/// Test that a missing file reports its path.
#[test]
fn test_load_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("absent.toml");
    match AnalysisConfig::load(&path) {
        Err(ConfigError::ReadFile { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected read error, got {other:?}"),
    }
}

/// Test that validation failures surface through `load_validated`.
#[test]
fn test_load_validated_rejects_bad_filter() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bad.toml");
    std::fs::write(&path, "sampling_interval = 0.1\n[filter]\nlb = 8.0\n").unwrap();

    let err = AnalysisConfig::load_validated(&path).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Validation(ValidationError::OutOfRange { .. })
    ));
}

/// Test that the loaded parameters configure the analyzers.
#[test]
fn test_config_drives_analyzers() {
    let config = AnalysisConfig::from_toml(DOCUMENT).unwrap();
    let rate = config.sampling_rate().unwrap();

    let n = 400;
    let signal: Vec<f64> = (0..n).map(|k| (k % 40) as f64).collect();
    let mut codes = vec![0.0; n];
    for onset in (10..n - 10).step_by(40) {
        codes[onset] = 1.0;
    }
    let target = TimeSeries::new(vec![signal.clone()], rate).unwrap();
    let events = TimeSeries::new(vec![codes], rate).unwrap();

    let params = config.event_related.params().unwrap();
    let analyzer = EventRelatedAnalyzer::new(&target, &events, params);
    let eta = analyzer.eta().unwrap().get(1).unwrap();
    assert_eq!(eta.len(), 8);
    assert!((eta.t0() + 0.02).abs() < 1e-12);
    assert_eq!(eta.channel(0)[0], 8.0);

    let reversed: Vec<f64> = signal.iter().rev().copied().collect();
    let pair = TimeSeries::new(vec![signal, reversed], rate).unwrap();
    let coherence = CoherenceAnalyzer::with_params(&pair, config.coherence);
    assert_eq!(coherence.spectral_density().unwrap().n_bins(), 17);

    let filtered = FilterAnalyzer::new(&target, config.filter);
    assert_eq!(filtered.filtered_fourier().unwrap().len(), n);
}
