//! Frequency-resolved coherence, cross-spectral phase, and delay.
//!
//! ```text
//! C_ij(f) = |S_ij(f)|² / (S_ii(f) · S_jj(f))
//! φ_ij(f) = arg S_ij(f)
//! d_ij(f) = -φ_ij(f) / (2π f)
//! ```
//!
//! `S` is the Welch cross-spectral density of the mean-removed channels (see
//! [`crate::spectrum`]). With `S_ij = conj(X_i) · X_j`, a channel j that lags
//! channel i by τ seconds has φ_ij(f) = -2πfτ, so the delay is positive.

use std::f64::consts::PI;

use neurotime_core::TimeSeries;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::fft::Window;
use crate::memo::Memo;
use crate::spectrum::{CrossSpectrum, welch_csd};
use crate::stats::{demean, is_constant};

/// Bins with less than this fraction of a channel's peak power count as empty.
const POWER_FLOOR: f64 = 1e-12;

/// Welch segmentation for spectral estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoherenceParams {
    /// Samples per segment (also the FFT size).
    pub segment_len: usize,
    /// Samples shared by consecutive segments.
    pub overlap: usize,
    /// Taper applied to every segment.
    pub window: Window,
}

impl Default for CoherenceParams {
    fn default() -> Self {
        Self {
            segment_len: 64,
            overlap: 32,
            window: Window::Hann,
        }
    }
}

impl CoherenceParams {
    /// Check the segmentation.
    pub fn validate(&self) -> Result<()> {
        if self.segment_len < 2 {
            return Err(AnalysisError::invalid_input(format!(
                "segment length must be at least 2, got {}",
                self.segment_len
            )));
        }
        if self.overlap >= self.segment_len {
            return Err(AnalysisError::invalid_input(format!(
                "overlap {} must be smaller than the segment length {}",
                self.overlap, self.segment_len
            )));
        }
        Ok(())
    }
}

/// A real value per channel pair and frequency bin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairSpectrum {
    n_channels: usize,
    frequencies: Vec<f64>,
    values: Vec<f64>,
}

impl PairSpectrum {
    fn from_fn<F>(n_channels: usize, frequencies: Vec<f64>, mut f: F) -> Self
    where
        F: FnMut(usize, usize, usize) -> f64,
    {
        let n_bins = frequencies.len();
        let mut values = Vec::with_capacity(n_channels * n_channels * n_bins);
        for i in 0..n_channels {
            for j in 0..n_channels {
                values.extend((0..n_bins).map(|bin| f(i, j, bin)));
            }
        }
        Self {
            n_channels,
            frequencies,
            values,
        }
    }

    /// Number of channels on each axis.
    pub fn n_channels(&self) -> usize {
        self.n_channels
    }

    /// Frequency axis (Hz).
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Number of frequency bins.
    pub fn n_bins(&self) -> usize {
        self.frequencies.len()
    }

    /// Values for the pair `(i, j)` across frequency.
    pub fn pair(&self, i: usize, j: usize) -> &[f64] {
        let start = (i * self.n_channels + j) * self.n_bins();
        &self.values[start..start + self.n_bins()]
    }

    /// Value for the pair `(i, j)` at frequency bin `bin`.
    pub fn at(&self, i: usize, j: usize, bin: usize) -> Option<f64> {
        if i >= self.n_channels || j >= self.n_channels {
            return None;
        }
        self.pair(i, j).get(bin).copied()
    }
}

/// Coherence and related spectral quantities between all channel pairs.
#[derive(Debug)]
pub struct CoherenceAnalyzer<'a> {
    input: &'a TimeSeries,
    params: CoherenceParams,
    csd: Memo<CrossSpectrum>,
    coherence: Memo<PairSpectrum>,
    phase: Memo<PairSpectrum>,
    delay: Memo<PairSpectrum>,
}

impl<'a> CoherenceAnalyzer<'a> {
    /// Analyzer with the default segmentation (64 samples, 50 % overlap, Hann).
    pub fn new(input: &'a TimeSeries) -> Self {
        Self::with_params(input, CoherenceParams::default())
    }

    /// Analyzer with explicit segmentation; checked on first use.
    pub fn with_params(input: &'a TimeSeries, params: CoherenceParams) -> Self {
        Self {
            input,
            params,
            csd: Memo::new(),
            coherence: Memo::new(),
            phase: Memo::new(),
            delay: Memo::new(),
        }
    }

    /// The segmentation in use.
    pub fn params(&self) -> &CoherenceParams {
        &self.params
    }

    /// Welch cross-spectral density matrix of the mean-removed channels.
    pub fn spectral_density(&self) -> Result<&CrossSpectrum> {
        self.csd.get_or_compute(|| {
            self.params.validate()?;
            if self.input.n_channels() < 2 {
                return Err(AnalysisError::invalid_input(format!(
                    "coherence needs at least 2 channels, got {}",
                    self.input.n_channels()
                )));
            }
            if self.input.len() <= self.params.segment_len {
                tracing::warn!(
                    len = self.input.len(),
                    segment_len = self.params.segment_len,
                    "signal fits in one segment; only the cross-spectrum is usable"
                );
            }
            let centered: Vec<Vec<f64>> = self.input.channels().map(demean).collect();
            Ok(welch_csd(
                &centered,
                self.input.sampling_rate(),
                self.params.segment_len,
                self.params.overlap,
                self.params.window,
            ))
        })
    }

    /// Magnitude-squared coherence; within [0, 1], exactly 1 on the diagonal.
    ///
    /// At least two Welch segments are required: the coherence of a single
    /// segment is 1 at every frequency whatever the data, so a signal no
    /// longer than `segment_len` is a [`AnalysisError::NumericalDegeneracy`].
    pub fn coherence(&self) -> Result<&PairSpectrum> {
        self.coherence.get_or_compute(|| {
            let csd = self.spectral_density()?;
            if csd.segments() < 2 {
                return Err(AnalysisError::degenerate(format!(
                    "{} samples give a single segment of {}; coherence needs at least 2",
                    self.input.len(),
                    self.params.segment_len
                )));
            }
            let power = self.checked_power(csd)?;
            Ok(PairSpectrum::from_fn(
                csd.n_channels(),
                csd.frequencies().to_vec(),
                |i, j, bin| {
                    if i == j {
                        return 1.0;
                    }
                    let (a, b) = if i < j { (i, j) } else { (j, i) };
                    let cross = csd.pair(a, b)[bin].norm_sqr();
                    (cross / (power[a][bin] * power[b][bin])).clamp(0.0, 1.0)
                },
            ))
        })
    }

    /// Cross-spectral phase `arg S_ij` in radians; `phase(j, i) = -phase(i, j)`.
    pub fn phase(&self) -> Result<&PairSpectrum> {
        self.phase.get_or_compute(|| {
            let csd = self.spectral_density()?;
            Ok(PairSpectrum::from_fn(
                csd.n_channels(),
                csd.frequencies().to_vec(),
                |i, j, bin| if i == j { 0.0 } else { csd.pair(i, j)[bin].arg() },
            ))
        })
    }

    /// Delay of channel j relative to channel i in seconds, over the non-DC bins.
    ///
    /// Only meaningful where the coherence is high and the phase has not
    /// wrapped (|τ| below half a period).
    pub fn delay(&self) -> Result<&PairSpectrum> {
        self.delay.get_or_compute(|| {
            let phase = self.phase()?;
            let frequencies = phase.frequencies()[1..].to_vec();
            Ok(PairSpectrum::from_fn(
                phase.n_channels(),
                frequencies.clone(),
                |i, j, bin| -phase.pair(i, j)[bin + 1] / (2.0 * PI * frequencies[bin]),
            ))
        })
    }

    fn checked_power(&self, csd: &CrossSpectrum) -> Result<Vec<Vec<f64>>> {
        if let Some(flat) = self.input.channels().position(is_constant) {
            return Err(AnalysisError::degenerate(format!(
                "channel {flat} is constant and has no spectral power"
            )));
        }
        (0..csd.n_channels())
            .map(|i| {
                let power = csd.power(i);
                let floor = POWER_FLOOR * power.iter().copied().fold(0.0, f64::max);
                match power.iter().position(|&p| p <= floor) {
                    Some(bin) => Err(AnalysisError::degenerate(format!(
                        "channel {i} has zero power at {} Hz",
                        csd.frequencies()[bin]
                    ))),
                    None => Ok(power),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white_noise(n: usize, seed: u32) -> Vec<f64> {
        let mut state = seed;
        (0..n)
            .map(|_| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                f64::from(state as i32) / f64::from(i32::MAX)
            })
            .collect()
    }

    fn delayed_pair(n: usize, delay: usize) -> TimeSeries {
        let source = white_noise(n + delay, 17);
        let x = source[delay..].to_vec();
        let y = source[..n].to_vec();
        TimeSeries::new(vec![x, y], 100.0).unwrap()
    }

    #[test]
    fn params_are_validated() {
        let ts = delayed_pair(256, 0);
        let bad = CoherenceParams {
            segment_len: 32,
            overlap: 32,
            window: Window::Hann,
        };
        let analyzer = CoherenceAnalyzer::with_params(&ts, bad);
        assert!(matches!(
            analyzer.coherence(),
            Err(AnalysisError::InvalidInput(_))
        ));
    }

    #[test]
    fn single_channel_is_rejected() {
        let ts = TimeSeries::from_channel(white_noise(128, 1), 1.0).unwrap();
        assert!(matches!(
            CoherenceAnalyzer::new(&ts).coherence(),
            Err(AnalysisError::InvalidInput(_))
        ));
    }

    #[test]
    fn constant_channel_is_degenerate() {
        let ts = TimeSeries::new(vec![white_noise(128, 1), vec![0.5; 128]], 1.0).unwrap();
        assert!(matches!(
            CoherenceAnalyzer::new(&ts).coherence(),
            Err(AnalysisError::NumericalDegeneracy(_))
        ));
    }

    #[test]
    fn single_segment_is_degenerate() {
        // 40 samples in one 64-sample segment: coherence would be 1 everywhere.
        let x = white_noise(40, 5);
        let y: Vec<f64> = x.iter().zip(white_noise(40, 6)).map(|(a, b)| a + 0.5 * b).collect();
        let ts = TimeSeries::new(vec![x, y], 1.0).unwrap();
        for window in [Window::Rectangular, Window::Hann] {
            let params = CoherenceParams {
                window,
                ..CoherenceParams::default()
            };
            let analyzer = CoherenceAnalyzer::with_params(&ts, params);
            assert_eq!(analyzer.spectral_density().unwrap().segments(), 1);
            assert!(analyzer.phase().is_ok());
            assert!(matches!(
                analyzer.coherence(),
                Err(AnalysisError::NumericalDegeneracy(_))
            ));
        }
    }

    #[test]
    fn round_off_power_is_degenerate() {
        // Non-overlapping rectangular segments over a signal with period 16:
        // every segment has the same zero mean, so the DC bin is round-off only.
        let tone: Vec<f64> = (0..256).map(|i| (2.0 * PI * i as f64 / 16.0).sin()).collect();
        let noise = white_noise(256, 8);
        let ts = TimeSeries::new(vec![noise, tone], 1.0).unwrap();
        let params = CoherenceParams {
            segment_len: 32,
            overlap: 0,
            window: Window::Rectangular,
        };
        let analyzer = CoherenceAnalyzer::with_params(&ts, params);
        let power = analyzer.spectral_density().unwrap().power(1);
        assert!(power[0] < 1e-20, "dc power {}", power[0]);
        assert!(matches!(
            analyzer.coherence(),
            Err(AnalysisError::NumericalDegeneracy(_))
        ));
    }

    #[test]
    fn identical_channels_are_fully_coherent() {
        let x = white_noise(512, 3);
        let ts = TimeSeries::new(vec![x.clone(), x], 1.0).unwrap();
        let coh = CoherenceAnalyzer::new(&ts).coherence().unwrap().clone();
        for &c in coh.pair(0, 1) {
            assert!((c - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn independent_noise_has_low_coherence() {
        let channels = vec![white_noise(8192, 3), white_noise(8192, 99)];
        let ts = TimeSeries::new(channels, 1.0).unwrap();
        let analyzer = CoherenceAnalyzer::new(&ts);
        let coh = analyzer.coherence().unwrap();
        let mean: f64 = coh.pair(0, 1).iter().sum::<f64>() / coh.n_bins() as f64;
        assert!(mean < 0.1, "mean coherence {mean}");
    }

    #[test]
    fn delay_recovers_lag() {
        // Channel 1 is channel 0 delayed by 3 samples (30 ms at 100 Hz).
        let ts = delayed_pair(4096, 3);
        let analyzer = CoherenceAnalyzer::with_params(
            &ts,
            CoherenceParams {
                segment_len: 256,
                overlap: 128,
                window: Window::Hann,
            },
        );
        let delay = analyzer.delay().unwrap();
        let coherence = analyzer.coherence().unwrap();
        assert_eq!(delay.n_bins(), coherence.n_bins() - 1);

        // The phase wraps above fs / (2 · 3 samples); the lowest bins are noisy.
        for bin in 10..30 {
            let d = delay.at(0, 1, bin - 1).unwrap();
            assert!((d - 0.03).abs() < 0.005, "bin {bin}: delay {d}");
        }
    }

    #[test]
    fn phase_is_antisymmetric() {
        let ts = delayed_pair(1024, 2);
        let phase = CoherenceAnalyzer::new(&ts).phase().unwrap().clone();
        for bin in 0..phase.n_bins() {
            assert_eq!(phase.at(0, 1, bin).unwrap(), -phase.at(1, 0, bin).unwrap());
        }
        assert!(phase.pair(0, 0).iter().all(|&p| p == 0.0));
        assert_eq!(phase.at(2, 0, 0), None);
    }

    #[test]
    fn tone_phase_matches_shift() {
        let fs = 64.0;
        let shift = PI / 4.0;
        let x: Vec<f64> = (0..1024).map(|i| (2.0 * PI * 8.0 * i as f64 / fs).sin()).collect();
        let y: Vec<f64> = (0..1024)
            .map(|i| (2.0 * PI * 8.0 * i as f64 / fs - shift).sin())
            .collect();
        let ts = TimeSeries::new(vec![x, y], fs).unwrap();
        let phase = CoherenceAnalyzer::new(&ts).phase().unwrap().clone();
        // 8 Hz is bin 8 with 64-sample segments at 64 Hz.
        assert!((phase.at(0, 1, 8).unwrap() + shift).abs() < 1e-9);
    }
}
