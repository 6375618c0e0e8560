//! Integration tests for neurotime-cli.
//!
//! Tests run the `neurotime` binary on small delimited files written to a
//! temporary directory.

use std::f64::consts::PI;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// Helper to get the path to the `neurotime` binary built by cargo.
fn neurotime_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_neurotime"))
}

/// Run with an empty config file so the user's default configuration is never read.
fn run(dir: &TempDir, args: &[&str]) -> Output {
    let config = dir.path().join("empty.toml");
    if !config.exists() {
        std::fs::write(&config, "").unwrap();
    }
    neurotime_bin()
        .arg("--config")
        .arg(&config)
        .args(args)
        .output()
        .expect("failed to run neurotime")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Write a CSV with a header: a 5 Hz sine, a shifted copy, and event codes.
fn write_recording(dir: &TempDir) -> PathBuf {
    let rate = 100.0;
    let mut text = String::from("# synthetic recording\nlfp,lagged,events\n");
    for k in 0..400 {
        let t = k as f64 / rate;
        let lfp = (2.0 * PI * 5.0 * t).sin();
        let lagged = (2.0 * PI * 5.0 * (t - 0.02)).sin();
        let code = if k % 40 == 10 && k < 380 { 1 } else { 0 };
        writeln!(text, "{lfp},{lagged},{code}").unwrap();
    }
    let path = dir.path().join("recording.csv");
    std::fs::write(&path, text).unwrap();
    path
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

// ---------------------------------------------------------------------------
// info
// ---------------------------------------------------------------------------

#[test]
fn cli_info_without_interval_shows_layout() {
    let dir = TempDir::new().unwrap();
    let input = write_recording(&dir);
    let output = run(&dir, &["info", input.to_str().unwrap()]);

    assert!(output.status.success(), "info failed: {output:?}");
    let text = stdout(&output);
    assert!(text.contains("Channels:    3"), "got: {text}");
    assert!(text.contains("Samples:     400"), "got: {text}");
    assert!(text.contains("lagged"));
}

#[test]
fn cli_info_with_interval_shows_duration() {
    let dir = TempDir::new().unwrap();
    let input = write_recording(&dir);
    let output = run(
        &dir,
        &["--sampling-interval", "0.01", "info", input.to_str().unwrap()],
    );

    assert!(output.status.success());
    assert!(stdout(&output).contains("Duration:    4.000000 s"));
}

// ---------------------------------------------------------------------------
// correlate
// ---------------------------------------------------------------------------

#[test]
fn cli_correlate_writes_json() {
    let dir = TempDir::new().unwrap();
    let input = write_recording(&dir);
    let json = dir.path().join("corr.json");
    let output = run(
        &dir,
        &[
            "correlate",
            input.to_str().unwrap(),
            "--sampling-interval",
            "0.01",
            "--lags",
            "3",
            "-o",
            json.to_str().unwrap(),
        ],
    );

    assert!(output.status.success(), "correlate failed: {output:?}");
    let report = read_json(&json);
    assert_eq!(report["channels"][1], "lagged");
    assert_eq!(report["correlation"][0][0], 1.0);
    assert_eq!(report["lags"].as_array().unwrap().len(), 7);
    // Three pairs for three columns.
    assert_eq!(report["xcorr_norm"].as_array().unwrap().len(), 3);
}

#[test]
fn cli_requires_sampling_interval() {
    let dir = TempDir::new().unwrap();
    let input = write_recording(&dir);
    let output = run(&dir, &["correlate", input.to_str().unwrap()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("sampling interval"), "got: {stderr}");
}

// ---------------------------------------------------------------------------
// event-related
// ---------------------------------------------------------------------------

#[test]
fn cli_event_related_from_config() {
    let dir = TempDir::new().unwrap();
    let input = write_recording(&dir);
    let config = dir.path().join("analysis.toml");
    std::fs::write(
        &config,
        "sampling_interval = 0.01\n[event_related]\nwindow_len = 20\noffset = -5\n",
    )
    .unwrap();
    let json = dir.path().join("eta.json");

    let output = neurotime_bin()
        .args(["--config", config.to_str().unwrap(), "event-related"])
        .arg(&input)
        .args(["--signal-column", "lfp", "--events-column", "events"])
        .args(["--estimator", "fir", "-o", json.to_str().unwrap()])
        .output()
        .unwrap();

    assert!(output.status.success(), "event-related failed: {output:?}");
    assert!(stdout(&output).contains("event 1: 10 trials"));

    let report = read_json(&json);
    assert_eq!(report["estimator"], "fir");
    let response = &report["response"]["responses"][0];
    let samples = response["channels"][0].as_array().unwrap();
    assert_eq!(samples.len(), 20);
    // Onsets sit at phase π; five samples earlier, a quarter cycle, the sine peaks.
    let first = samples[0].as_f64().unwrap();
    assert!((first - 1.0).abs() < 1e-6, "got {first}");
}

#[test]
fn cli_event_related_needs_window() {
    let dir = TempDir::new().unwrap();
    let input = write_recording(&dir);
    let output = run(
        &dir,
        &[
            "--sampling-interval",
            "0.01",
            "event-related",
            input.to_str().unwrap(),
            "--signal-column",
            "0",
            "--events-column",
            "2",
        ],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("window length"), "got: {stderr}");
}

// ---------------------------------------------------------------------------
// coherence, hilbert, filter
// ---------------------------------------------------------------------------

#[test]
fn cli_coherence_reports_pairs() {
    let dir = TempDir::new().unwrap();
    let input = write_recording(&dir);
    let json = dir.path().join("coh.json");
    let output = run(
        &dir,
        &[
            "--sampling-interval",
            "0.01",
            "coherence",
            input.to_str().unwrap(),
            "--segment-len",
            "48",
            "--window",
            "hamming",
            "-o",
            json.to_str().unwrap(),
        ],
    );

    assert!(output.status.success(), "coherence failed: {output:?}");
    assert!(stdout(&output).contains("lfp / lagged"));
    let report = read_json(&json);
    assert_eq!(report["frequencies"].as_array().unwrap().len(), 25);
    for pair in report["pairs"].as_array().unwrap() {
        for c in pair["coherence"].as_array().unwrap() {
            let c = c.as_f64().unwrap();
            assert!((0.0..=1.0).contains(&c));
        }
    }
}

#[test]
fn cli_coherence_rejects_unknown_window() {
    let dir = TempDir::new().unwrap();
    let input = write_recording(&dir);
    let output = run(
        &dir,
        &[
            "--sampling-interval",
            "0.01",
            "coherence",
            input.to_str().unwrap(),
            "--window",
            "kaiser",
        ],
    );
    assert!(!output.status.success());
}

#[test]
fn cli_hilbert_summarizes_envelope() {
    let dir = TempDir::new().unwrap();
    let input = write_recording(&dir);
    let output = run(
        &dir,
        &["--sampling-interval", "0.01", "hilbert", input.to_str().unwrap()],
    );
    assert!(output.status.success(), "hilbert failed: {output:?}");
    let text = stdout(&output);
    let lfp = text.lines().find(|l| l.starts_with("lfp")).unwrap();
    let fields: Vec<f64> = lfp
        .split_whitespace()
        .skip(1)
        .map(|f| f.parse().unwrap())
        .collect();
    // 20 whole cycles: unit envelope at 5 Hz.
    assert!((fields[0] - 1.0).abs() < 1e-6, "got: {lfp}");
    assert!((fields[2] - 5.0).abs() < 1e-6, "got: {lfp}");
}

#[test]
fn cli_filter_rejects_band_above_nyquist() {
    let dir = TempDir::new().unwrap();
    let input = write_recording(&dir);
    let output = run(
        &dir,
        &[
            "--sampling-interval",
            "0.01",
            "filter",
            input.to_str().unwrap(),
            "--ub",
            "80",
        ],
    );
    assert!(!output.status.success());
}

#[test]
fn cli_filter_writes_filtered_columns() {
    let dir = TempDir::new().unwrap();
    let input = write_recording(&dir);
    let json = dir.path().join("filtered.json");
    let output = run(
        &dir,
        &[
            "--sampling-interval",
            "0.01",
            "filter",
            input.to_str().unwrap(),
            "--lb",
            "10",
            "-o",
            json.to_str().unwrap(),
        ],
    );

    assert!(output.status.success(), "filter failed: {output:?}");
    let report = read_json(&json);
    assert_eq!(report["lb"], 10.0);
    let lfp = report["data"][0].as_array().unwrap();
    assert_eq!(lfp.len(), 400);
    // The 5 Hz tone lies below the cutoff and is removed.
    assert!(lfp.iter().all(|v| v.as_f64().unwrap().abs() < 1e-9));
}
